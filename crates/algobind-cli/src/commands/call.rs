use crate::commands::bind::{bind_all_or_exit, entries_for_target};
use crate::support::{Settings, exit_with, parse_json_or_exit, print_json_or_exit};
use algobind_kernel::{ArgValue, TypedValue};
use serde_json::Value;

pub struct Args {
    pub target: String,
    pub member: String,
    pub receiver: Option<String>,
    pub args: Vec<String>,
    pub named: Option<String>,
    pub json: bool,
}

/// A `{"$type": ...}` object keeps its type; any other JSON value is taken to
/// be an instance of the call's target.
fn receiver_from_json(target: &str, value: Value) -> TypedValue {
    match ArgValue::from_json(value.clone()) {
        ArgValue::Typed(typed) => typed,
        _ => TypedValue::new(target, value),
    }
}

pub fn run(settings: &Settings, args: Args) {
    let binder = settings.binder_or_exit();
    let entries = entries_for_target(&settings.config, &args.target);
    let (targets, _) = bind_all_or_exit(&binder, &entries);
    let Some(target) = targets.get(&args.target) else {
        exit_with(format!("nothing bound for {}", args.target));
    };

    let values = match &args.named {
        Some(text) => {
            let record = ArgValue::record_from_json(parse_json_or_exit(text, "--named"))
                .unwrap_or_else(|| exit_with("--named must be a JSON object"));
            vec![record]
        }
        None => args
            .args
            .iter()
            .map(|text| ArgValue::from_json(parse_json_or_exit(text, "--args")))
            .collect(),
    };

    let result = match &args.receiver {
        Some(text) => {
            let receiver = receiver_from_json(&args.target, parse_json_or_exit(text, "--receiver"));
            target.call_method(&receiver, &args.member, values)
        }
        None => target.call_static(&args.member, values),
    };
    let invocation = result.unwrap_or_else(|e| exit_with(e));

    if args.json {
        print_json_or_exit(&invocation);
        return;
    }

    println!("algobind call");
    println!("  Function: {}", invocation.function);
    println!("  Arguments:");
    for (name, value) in &invocation.arguments {
        let rendered = serde_json::to_string(value).unwrap_or_else(|e| exit_with(e));
        println!("    {name} = {rendered}");
    }
}
