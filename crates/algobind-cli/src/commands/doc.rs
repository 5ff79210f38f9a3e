use crate::support::{Settings, exit_with, print_json_or_exit};
use serde_json::json;

pub fn run(settings: &Settings, name: String, json_output: bool) {
    let registry = settings.registry_or_exit();
    let function = registry.lookup(&name).unwrap_or_else(|e| exit_with(e));

    if json_output {
        print_json_or_exit(&json!({
            "name": function.name(),
            "signature": function.signature(),
            "doc": function.doc(),
        }));
        return;
    }
    println!("{}", function.doc());
}
