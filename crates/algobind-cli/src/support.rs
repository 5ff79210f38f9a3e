use algobind_catalog::{CONFIG_FILE_NAME, Config, JsonFileSource, load_config};
use algobind_kernel::{Binder, InvocationRecorder, Registry};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Report `message` on stderr and exit with status 1.
pub fn exit_with(message: impl Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

/// Install the stderr `fmt` subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    use std::io::IsTerminal;
    use std::sync::OnceLock;
    use tracing_subscriber::{EnvFilter, fmt};

    static INITIALISED: OnceLock<()> = OnceLock::new();

    INITIALISED.get_or_init(|| {
        let directive = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
        let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let subscriber = fmt::fmt()
            .with_env_filter(filter)
            .with_ansi(use_ansi)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Flags merged over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    catalog: Option<PathBuf>,
}

impl Settings {
    pub fn from_flags(catalog: Option<String>, config: Option<String>) -> Self {
        let config = match config {
            Some(path) => load_config_or_exit(Path::new(&path)),
            None => {
                let default = Path::new(CONFIG_FILE_NAME);
                if default.is_file() {
                    load_config_or_exit(default)
                } else {
                    Config::default()
                }
            }
        };
        let catalog = catalog.map(PathBuf::from).or_else(|| config.catalog.clone());
        Self { config, catalog }
    }

    pub fn catalog_source_or_exit(&self) -> JsonFileSource {
        match &self.catalog {
            Some(path) => JsonFileSource::new(path),
            None => exit_with(format!(
                "no catalogue: pass --catalog or set `catalog` in {CONFIG_FILE_NAME}"
            )),
        }
    }

    pub fn registry_or_exit(&self) -> Registry {
        Registry::new(self.catalog_source_or_exit())
    }

    pub fn binder_or_exit(&self) -> Binder<InvocationRecorder> {
        Binder::new(
            self.registry_or_exit(),
            self.config.subtype_table(),
            InvocationRecorder,
        )
    }
}

fn load_config_or_exit(path: &Path) -> Config {
    load_config(path).unwrap_or_else(|e| exit_with(e))
}

pub fn parse_json_or_exit(text: &str, label: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|e| exit_with(format!("invalid {label} JSON: {e}")))
}

pub fn print_json_or_exit<T: Serialize + ?Sized>(payload: &T) {
    let rendered = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|e| exit_with(format!("failed to render json: {e}")));
    println!("{rendered}");
}
