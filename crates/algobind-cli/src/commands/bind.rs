use crate::support::{Settings, exit_with, print_json_or_exit};
use algobind_catalog::{BindTarget, Config};
use algobind_kernel::{BindReport, Binder, Invocation, InvocationRecorder, TargetType};
use serde_json::json;
use std::collections::BTreeMap;

pub type Targets = BTreeMap<String, TargetType<Invocation>>;

/// Configured `[[bind]]` entries for `target`, or a default entry.
pub fn entries_for_target(config: &Config, target: &str) -> Vec<BindTarget> {
    let entries: Vec<_> = config
        .bind
        .iter()
        .filter(|entry| entry.target == target)
        .cloned()
        .collect();
    if entries.is_empty() {
        vec![BindTarget::new(target)]
    } else {
        entries
    }
}

/// Run every entry in order. Entries sharing a target bind onto the same
/// member tables.
pub fn bind_all_or_exit(
    binder: &Binder<InvocationRecorder>,
    entries: &[BindTarget],
) -> (Targets, Vec<BindReport>) {
    let mut targets = Targets::new();
    let mut reports = Vec::with_capacity(entries.len());
    for entry in entries {
        let target = targets
            .entry(entry.target.clone())
            .or_insert_with(|| TargetType::new(entry.target.clone()));
        let report = binder
            .bind(
                target,
                entry.prefix(),
                entry.type_name(),
                entry.prepend.as_deref(),
            )
            .unwrap_or_else(|e| exit_with(e));
        reports.push(report);
    }
    (targets, reports)
}

pub fn run(
    settings: &Settings,
    target: Option<String>,
    prefix: Option<String>,
    type_name: Option<String>,
    prepend: Option<String>,
    json_output: bool,
) {
    let entries = match target {
        Some(target) => vec![BindTarget {
            target,
            prefix,
            type_name,
            prepend,
        }],
        None => settings.config.bind.clone(),
    };
    if entries.is_empty() {
        exit_with("no bind targets: pass --target or add [[bind]] entries to the config");
    }

    let binder = settings.binder_or_exit();
    let (targets, reports) = bind_all_or_exit(&binder, &entries);
    let unbound = binder
        .registry()
        .unbound_entries()
        .unwrap_or_else(|e| exit_with(e));

    if json_output {
        print_json_or_exit(&json!({
            "binds": &reports,
            "unbound": unbound.keys().collect::<Vec<_>>(),
        }));
        return;
    }

    println!("algobind bind");
    for report in &reports {
        println!(
            "  {} (prefix {}, type {}): {} members",
            report.target,
            report.prefix,
            report.type_name,
            report.len()
        );
        let Some(target) = targets.get(&report.target) else {
            continue;
        };
        for entry in &report.members {
            let Some(member) = target
                .member(entry.kind, &entry.member)
                .and_then(|member| member.as_bound())
            else {
                continue;
            };
            match &entry.renamed_from {
                Some(original) => println!("    {member}  (renamed from {original})"),
                None => println!("    {member}"),
            }
        }
    }
    println!("  Unbound algorithms: {}", unbound.len());
}
