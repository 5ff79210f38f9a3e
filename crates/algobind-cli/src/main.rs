//! Algobind CLI: the `algobind` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::init_logging(cli.verbose);
    let settings = support::Settings::from_flags(cli.catalog, cli.config);

    match cli.command {
        Commands::Signatures {
            prefix,
            background,
            json,
        } => commands::signatures::run(&settings, prefix, background, json),

        Commands::Doc { name, json } => commands::doc::run(&settings, name, json),

        Commands::Bind {
            target,
            prefix,
            type_name,
            prepend,
            json,
        } => commands::bind::run(&settings, target, prefix, type_name, prepend, json),

        Commands::Call {
            target,
            member,
            receiver,
            args,
            named,
            json,
        } => commands::call::run(
            &settings,
            commands::call::Args {
                target,
                member,
                receiver,
                args,
                named,
                json,
            },
        ),
    }
}
