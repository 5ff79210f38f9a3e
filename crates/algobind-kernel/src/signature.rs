//! Algorithm signatures and catalogue parsing.
//!
//! A catalogue is a JSON object mapping fully-qualified algorithm names
//! (`Image.constant`) to their declared return type, ordered parameters, and
//! description. The root may also be wrapped as `{"algorithms": {...}}`.

use crate::error::RegistryError;
use crate::types::{OBJECT_TYPE, strip_generic};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Parsed catalogue: algorithm name to signature.
pub type Catalog = BTreeMap<String, Signature>;

/// One declared parameter. Order within [`Signature::args`] defines the
/// positional mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: String,
}

impl ArgSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            required: true,
            default: None,
            description: String::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Declared name, return type, and ordered parameter list of one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    #[serde(default)]
    pub name: String,
    pub returns: String,
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
}

impl Signature {
    pub fn new(returns: impl Into<String>, args: Vec<ArgSpec>) -> Self {
        Self {
            name: String::new(),
            returns: returns.into(),
            args,
            description: String::new(),
            deprecated: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Strip generic suffixes from the return type and every parameter type.
    pub fn normalized(mut self) -> Self {
        self.returns = strip_generic(&self.returns);
        for arg in &mut self.args {
            arg.type_name = strip_generic(&arg.type_name);
        }
        self
    }

    pub fn arg(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|arg| arg.name == name)
    }

    pub fn first_arg(&self) -> Option<&ArgSpec> {
        self.args.first()
    }

    /// Human-readable documentation: call form, description, and one line
    /// per parameter.
    pub fn doc(&self) -> String {
        let params = self
            .args
            .iter()
            .map(|arg| {
                if arg.required {
                    arg.name.clone()
                } else {
                    format!("[{}]", arg.name)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut out = format!("{}({}) -> {}", self.name, params, self.returns);
        if !self.description.is_empty() {
            let _ = write!(out, "\n\n{}", self.description);
        }
        if let Some(reason) = &self.deprecated {
            if reason.is_empty() {
                out.push_str("\n\nDEPRECATED");
            } else {
                let _ = write!(out, "\n\nDEPRECATED: {reason}");
            }
        }
        if !self.args.is_empty() {
            out.push_str("\n\nArgs:");
            for arg in &self.args {
                let optional = if arg.required { "" } else { ", optional" };
                let _ = write!(out, "\n  {} ({}{})", arg.name, arg.type_name, optional);
                if !arg.description.is_empty() {
                    let _ = write!(out, ": {}", arg.description);
                }
            }
        }
        out
    }
}

#[derive(Debug, Deserialize)]
struct RawArgSpec {
    name: String,
    #[serde(rename = "type", default = "object_type")]
    type_name: String,
    #[serde(default)]
    required: Option<bool>,
    #[serde(default)]
    optional: Option<bool>,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSignature {
    returns: String,
    #[serde(default)]
    args: Vec<RawArgSpec>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    deprecated: Option<Value>,
}

fn object_type() -> String {
    OBJECT_TYPE.to_string()
}

impl RawArgSpec {
    fn into_arg_spec(self) -> ArgSpec {
        let required = self
            .required
            .unwrap_or_else(|| !self.optional.unwrap_or(false));
        ArgSpec {
            name: self.name,
            type_name: self.type_name,
            required,
            default: self.default,
            description: self.description.unwrap_or_default(),
        }
    }
}

impl RawSignature {
    fn into_signature(self, name: &str) -> Signature {
        let deprecated = match self.deprecated {
            Some(Value::String(reason)) => Some(reason),
            Some(Value::Bool(true)) => Some(String::new()),
            _ => None,
        };
        Signature {
            name: name.to_string(),
            returns: self.returns,
            args: self
                .args
                .into_iter()
                .map(RawArgSpec::into_arg_spec)
                .collect(),
            description: self.description.unwrap_or_default(),
            deprecated,
        }
    }
}

/// Parse a catalogue document.
///
/// Type names are kept as written; the registry normalizes them when it
/// builds function handles.
pub fn parse_catalog(raw: &Value) -> Result<Catalog, RegistryError> {
    let Some(mut entries) = raw.as_object() else {
        return Err(RegistryError::InvalidCatalog {
            name: "<root>".to_string(),
            message: "catalogue root must be an object".to_string(),
        });
    };
    if entries.len() == 1
        && let Some(inner) = entries.get("algorithms").and_then(Value::as_object)
    {
        entries = inner;
    }

    let mut catalog = Catalog::new();
    for (name, entry) in entries {
        let raw_signature: RawSignature =
            serde_json::from_value(entry.clone()).map_err(|e| RegistryError::InvalidCatalog {
                name: name.clone(),
                message: e.to_string(),
            })?;
        catalog.insert(name.clone(), raw_signature.into_signature(name));
    }
    Ok(catalog)
}
