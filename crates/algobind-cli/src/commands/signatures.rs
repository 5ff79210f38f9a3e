use crate::support::{Settings, exit_with, print_json_or_exit};
use algobind_catalog::{ThreadedSource, populate_async};
use algobind_kernel::Registry;
use std::collections::BTreeMap;

pub fn run(settings: &Settings, prefix: Option<String>, background: bool, json_output: bool) {
    let registry = if background {
        populate_in_background(settings)
    } else {
        settings.registry_or_exit()
    };

    let scope = prefix.map(|prefix| format!("{prefix}."));
    let functions: BTreeMap<_, _> = registry
        .entries()
        .unwrap_or_else(|e| exit_with(e))
        .into_iter()
        .filter(|(name, _)| scope.as_ref().is_none_or(|scope| name.starts_with(scope)))
        .collect();

    if json_output {
        let signatures: BTreeMap<_, _> = functions
            .iter()
            .map(|(name, function)| (name, function.signature()))
            .collect();
        print_json_or_exit(&signatures);
        return;
    }

    println!("algobind signatures");
    println!("  Algorithms: {}", functions.len());
    for function in functions.values() {
        println!("  {function} -> {}", function.signature().returns);
    }
}

fn populate_in_background(settings: &Settings) -> Registry {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| exit_with(format!("failed to start runtime: {e}")));
    let source = ThreadedSource::new(settings.catalog_source_or_exit(), runtime.handle().clone());
    let registry = Registry::new(source);
    runtime
        .block_on(populate_async(&registry))
        .unwrap_or_else(|e| exit_with(e));
    registry
}
