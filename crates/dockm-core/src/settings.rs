//! Application settings read by the proxy.

use serde::{Deserialize, Serialize};

/// A label key/value pair, used for the label blacklist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelPair {
    /// Label key.
    pub name: String,
    /// Label value.
    pub value: String,
}

/// Global settings. Only the label blacklist is consumed by the proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    /// URL of the application templates definition.
    #[serde(default, rename = "TemplatesURL")]
    pub templates_url: String,
    /// Resources carrying any of these labels are hidden from list responses.
    #[serde(default)]
    pub black_listed_labels: Vec<LabelPair>,
}
