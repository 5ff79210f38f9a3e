use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "algobind",
    about = "Algobind: bind a server-declared algorithm catalogue onto client types",
    version
)]
pub struct Cli {
    /// Catalogue JSON file (overrides `catalog` in the config file)
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// Config file (defaults to ./algobind.toml when present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log verbosity: -v info, -vv debug, -vvv trace (RUST_LOG wins)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List catalogue signatures
    Signatures {
        /// Only names of the form `<prefix>.<rest>`
        #[arg(long)]
        prefix: Option<String>,

        /// Populate through a background fetch instead of a blocking one
        #[arg(long)]
        background: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the documentation of one algorithm
    Doc {
        /// Fully-qualified algorithm name, e.g. `Image.add`
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bind catalogue functions onto target types and print the member table
    Bind {
        /// Target type to bind (defaults to the config's [[bind]] entries)
        #[arg(long)]
        target: Option<String>,

        /// Catalogue name prefix (defaults to the target)
        #[arg(long, requires = "target")]
        prefix: Option<String>,

        /// Client type used for instance classification (defaults to the target)
        #[arg(long, requires = "target")]
        type_name: Option<String>,

        /// String prepended to every generated member name
        #[arg(long, requires = "target")]
        prepend: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bind, then invoke one member and print the resulting invocation
    Call {
        /// Target type, e.g. `Image`
        target: String,

        /// Member name on the target
        member: String,

        /// Receiver for an instance call: JSON, or `{"$type": T, "value": V}`
        #[arg(long)]
        receiver: Option<String>,

        /// Positional argument as JSON (repeatable)
        #[arg(long = "args", conflicts_with = "named")]
        args: Vec<String>,

        /// Single JSON object selecting the named-record convention
        #[arg(long)]
        named: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
