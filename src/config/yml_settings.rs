use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Root of a catalog file, shaped like the dispatch library's `details()` output
#[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CatalogSettings {
    #[serde(default)]
    pub schemas: Vec<ServiceSettings>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ServiceSettings {
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secure_protocols: Vec<String>,
    #[serde(default)]
    pub details: DetailSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct DetailSettings {
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default)]
    pub tokens: BTreeMap<String, TokenSettings>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct TokenSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// `[pattern]` or `[pattern, flags]`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regex: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Scalar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delim: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<String>,
}

/// Allowed-value entries arrive as strings, numbers or booleans
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Str(s) => write!(f, "{}", s),
        }
    }
}
