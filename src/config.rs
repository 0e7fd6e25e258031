//! Analysis options.

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

pub const DEFAULT_INCARNATION_STEREOTYPE: &str = "incarnates";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisOptions {
    /// Analyse sibling scopes on the rayon pool.
    pub parallel_scopes: bool,
    /// Emit the per-scope `ProcessNotSound` rollup.
    pub report_process_not_sound: bool,
    /// Stereotype on concrete tasks naming their reference activity.
    pub incarnation_stereotype: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel_scopes: true,
            report_process_not_sound: true,
            incarnation_stereotype: DEFAULT_INCARNATION_STEREOTYPE.to_string(),
        }
    }
}

impl AnalysisOptions {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        serde_json::from_str(json).map_err(|source| LoadError::Json {
            what: "analysis options",
            source,
        })
    }

    /// Options for single-threaded hosts such as the browser.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel_scopes: false,
            ..Self::default()
        }
    }
}
