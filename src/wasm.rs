//! WASM entry points for browser use.

use wasm_bindgen::prelude::*;

use crate::analyzer::Analyzer;
use crate::config::AnalysisOptions;
use crate::error::{Failure, LoadError};

/// Validate a compilation unit JSON: build + structural + soundness.
/// Returns a JSON array of failure objects.
#[wasm_bindgen]
pub fn validate_model(json: &str) -> JsValue {
    let result = validate_model_inner(json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_model_inner(json: &str) -> Vec<FailureDto> {
    let unit = match crate::model::load(json) {
        Ok(unit) => unit,
        Err(e) => return vec![FailureDto::from(e)],
    };

    // The browser has no thread pool.
    match Analyzer::new(AnalysisOptions::sequential()).analyze_unit(&unit) {
        Ok(failures) => failures.into_iter().map(FailureDto::from).collect(),
        Err(e) => vec![FailureDto {
            kind: "Cancelled".into(),
            category: "Analysis".into(),
            message: e.to_string(),
            node_ids: vec![],
        }],
    }
}

/// Check a concrete process JSON against a reference process JSON.
/// Returns a JSON array of conformance failure objects.
#[wasm_bindgen]
pub fn check_conformance_json(concrete_json: &str, reference_json: &str) -> JsValue {
    let result = check_conformance_inner(concrete_json, reference_json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn check_conformance_inner(concrete_json: &str, reference_json: &str) -> Vec<FailureDto> {
    let concrete = match crate::model::load_process(concrete_json) {
        Ok(p) => p,
        Err(e) => return vec![FailureDto::from(e)],
    };
    let reference = match crate::model::load_process(reference_json) {
        Ok(p) => p,
        Err(e) => return vec![FailureDto::from(e)],
    };

    Analyzer::new(AnalysisOptions::sequential())
        .check_conformance(&concrete, &reference)
        .into_iter()
        .map(FailureDto::from)
        .collect()
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct FailureDto {
    kind: String,
    category: String,
    message: String,
    node_ids: Vec<String>,
}

impl From<Failure> for FailureDto {
    fn from(f: Failure) -> Self {
        FailureDto {
            kind: f.kind().to_string(),
            category: f.category().to_string(),
            message: f.to_string(),
            node_ids: f.node_ids().into_iter().map(str::to_string).collect(),
        }
    }
}

impl From<LoadError> for FailureDto {
    fn from(e: LoadError) -> Self {
        FailureDto {
            kind: "InvalidJson".into(),
            category: "Load".into(),
            message: e.to_string(),
            node_ids: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_json_becomes_a_load_failure() {
        let result = validate_model_inner("{");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, "InvalidJson");
        assert!(result[0].message.starts_with("failed to parse compilation unit JSON"));
    }

    #[test]
    fn dead_node_dto() {
        let json = r#"{ "processes": [{
            "name": "P",
            "elements": [
                { "element": "startEvent", "id": "S" },
                { "element": "endEvent", "id": "E" },
                { "element": "task", "id": "T" }
            ],
            "flows": [{ "path": [
                { "step": "ref", "elementRef": "S" },
                { "step": "ref", "elementRef": "E" }
            ] }]
        }] }"#;
        let result = validate_model_inner(json);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, "DeadNode");
        assert_eq!(result[0].category, "Soundness");
        assert_eq!(result[0].node_ids, vec!["T".to_string()]);
    }

    #[test]
    fn conformance_reports_missing_incarnation() {
        let reference = r#"{ "name": "Ref", "elements": [{ "element": "task", "id": "Write" }] }"#;
        let concrete = r#"{ "name": "Impl", "elements": [
            { "element": "task", "id": "Draft", "stereotypes": [{ "name": "incarnates", "value": "Write" }] },
            { "element": "task", "id": "Extra" }
        ] }"#;
        let result = check_conformance_inner(concrete, reference);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, "TaskNotIncarnated");
        assert_eq!(result[0].node_ids, vec!["Extra".to_string()]);
    }
}
