//! `algobind.toml` configuration.
//!
//! ```toml
//! catalog = "catalog.json"
//!
//! [subtypes]
//! Element = ["Geometry"]
//!
//! [[bind]]
//! target = "Image"
//!
//! [[bind]]
//! target = "Collection"
//! type_name = "FeatureCollection"
//! prepend = "agg_"
//! ```

use crate::CatalogError;
use algobind_kernel::SubtypeTable;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "algobind.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Catalogue file. Relative paths are resolved against the config file.
    pub catalog: Option<PathBuf>,
    /// Extra subtype relations: parent type to its direct subtypes.
    pub subtypes: BTreeMap<String, Vec<String>>,
    pub bind: Vec<BindTarget>,
}

/// One `[[bind]]` entry. `prefix` and `type_name` default to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindTarget {
    pub target: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub prepend: Option<String>,
}

impl BindTarget {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            prefix: None,
            type_name: None,
            prepend: None,
        }
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(&self.target)
    }

    pub fn type_name(&self) -> &str {
        self.type_name.as_deref().unwrap_or(&self.target)
    }
}

impl Config {
    /// The geospatial hierarchy plus any configured relations.
    pub fn subtype_table(&self) -> SubtypeTable {
        let mut table = SubtypeTable::geospatial();
        table.extend(&self.subtypes);
        table
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config, CatalogError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| CatalogError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut config: Config = toml::from_str(&text).map_err(|e| CatalogError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if let Some(catalog) = &config.catalog
        && catalog.is_relative()
        && let Some(dir) = path.parent()
    {
        config.catalog = Some(dir.join(catalog));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use algobind_kernel::TypeMatcher;

    struct ScratchDir(PathBuf);

    impl ScratchDir {
        fn new(label: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "algobind-config-{}-{label}",
                std::process::id()
            ));
            let _ = fs::remove_dir_all(&path);
            fs::create_dir_all(&path).expect("scratch dir should be creatable");
            Self(path)
        }
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn load_config_resolves_catalog_and_bind_defaults() {
        let dir = ScratchDir::new("full");
        let path = dir.0.join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
catalog = "catalog.json"

[subtypes]
Element = ["Geometry"]

[[bind]]
target = "Image"

[[bind]]
target = "Collection"
type_name = "FeatureCollection"
prepend = "agg_"
"#,
        )
        .expect("write config");

        let config = load_config(&path).expect("config parses");
        assert_eq!(config.catalog, Some(dir.0.join("catalog.json")));
        assert_eq!(config.bind.len(), 2);
        assert_eq!(config.bind[0].prefix(), "Image");
        assert_eq!(config.bind[0].type_name(), "Image");
        assert_eq!(config.bind[1].prefix(), "Collection");
        assert_eq!(config.bind[1].type_name(), "FeatureCollection");
        assert_eq!(config.bind[1].prepend.as_deref(), Some("agg_"));

        let table = config.subtype_table();
        assert!(table.accepts("Element", "Geometry"));
        assert!(table.accepts("Collection", "ImageCollection"));
    }

    #[test]
    fn empty_config_is_default() {
        let config: Config = toml::from_str("").expect("empty config parses");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = ScratchDir::new("unknown");
        let path = dir.0.join(CONFIG_FILE_NAME);
        fs::write(&path, "[[bind]]\ntarget = \"Image\"\nprefx = \"Img\"\n").expect("write config");
        assert!(matches!(
            load_config(&path),
            Err(CatalogError::Config { .. })
        ));
    }
}
