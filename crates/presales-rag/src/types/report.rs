//! Report kinds and the JSON report schema

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which report template to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Four-section markdown-style summary
    Human,
    /// Flat six-key JSON extraction
    Json,
}

/// A JSON report field: the model may answer with a list or a single string
/// (e.g. `"Not Specified"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportField {
    Many(Vec<String>),
    One(String),
}

/// The six-key JSON report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonReport {
    pub workload_types: ReportField,
    pub capacity_needs: ReportField,
    pub performance_needs: ReportField,
    pub connectivity_needs: ReportField,
    pub key_features_requested: ReportField,
    pub recommended_products: ReportField,
}

impl JsonReport {
    /// Check generated text against the schema.
    ///
    /// A surrounding Markdown code fence is tolerated; anything else around
    /// the object is a violation.
    pub fn parse(text: &str) -> Result<Self> {
        let body = strip_code_fence(text.trim());
        serde_json::from_str(body).map_err(|e| Error::ReportSchema(e.to_string()))
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
