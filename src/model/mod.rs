//! Load phase: parser JSON → declarative model.

pub mod types;

pub use types::*;

use crate::error::LoadError;

/// Deserialize a compilation unit (every process of one source file).
pub fn load(json: &str) -> Result<CompilationUnit, LoadError> {
    serde_json::from_str::<CompilationUnit>(json).map_err(|source| LoadError::Json {
        what: "compilation unit",
        source,
    })
}

/// Deserialize a single process.
pub fn load_process(json: &str) -> Result<Process, LoadError> {
    serde_json::from_str::<Process>(json).map_err(|source| LoadError::Json {
        what: "process",
        source,
    })
}
