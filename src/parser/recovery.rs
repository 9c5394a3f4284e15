//! Recovery of assessment results from raw oracle text
//!
//! Stages run in order: trim, unwrap a fenced block, slice the outermost
//! array, strip trailing commas, strict parse. If the fenced interior does
//! not parse, the whole trimmed text gets the same treatment. When the strict
//! parse still fails (usually a token-limit truncation) the depth scanner
//! salvages every complete top-level object, scanning from the first bracket
//! or brace to the end of the text. Each surviving element is then validated
//! on its own.

use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

use super::scanner::{extract_fenced, slice_array, strip_trailing_commas, structural_tail, DepthScanner};
use crate::error::{ParseError, ValidationError};
use crate::models::{AssessmentResult, AssessmentStatus, Severity};

pub struct ResponseRecoveryParser;

impl ResponseRecoveryParser {
    /// Parse raw oracle output into validated assessment results.
    ///
    /// A valid empty array is an empty success. Every other path that yields
    /// no usable element is a `ParseError` carrying the start of the response.
    pub fn parse(raw: &str) -> Result<Vec<AssessmentResult>, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ParseError::new("Oracle response was empty", raw));
        }

        let fenced = extract_fenced(trimmed);
        let candidates: Vec<&str> = fenced.into_iter().chain(Some(trimmed)).collect();

        let strict = candidates.iter().find_map(|candidate| strict_array(candidate));
        let elements = match strict {
            Some(items) => items,
            None => {
                // In truncated text the last `]` can belong to a nested
                // array, so salvage runs to the end instead of the last `]`
                let salvaged = candidates
                    .iter()
                    .map(|candidate| salvage_objects(&strip_trailing_commas(structural_tail(candidate))))
                    .find(|objects| !objects.is_empty())
                    .unwrap_or_default();
                if salvaged.is_empty() {
                    return Err(ParseError::new(
                        "No complete JSON object found in oracle response",
                        raw,
                    ));
                }
                debug!(
                    recovered = salvaged.len(),
                    "Strict parse failed, recovered complete objects"
                );
                salvaged
            }
        };

        validate_elements(elements, raw)
    }
}

/// `text` as a JSON array after slicing and comma cleanup, if it is one.
/// Text opening with `{` is left unsliced so a lone object falls through to
/// salvage.
fn strict_array(text: &str) -> Option<Vec<Value>> {
    let sliced = if text.starts_with('{') {
        text
    } else {
        slice_array(text)
    };
    match serde_json::from_str::<Value>(&strip_trailing_commas(sliced)) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// Every complete top-level object in `text`.
///
/// The objects are first parsed together as one array. If one of them is
/// internally malformed, they are parsed one by one and the bad ones are
/// skipped.
fn salvage_objects(text: &str) -> Vec<Value> {
    let objects = DepthScanner::complete_objects(text);
    if objects.is_empty() {
        return Vec::new();
    }

    let joined = format!("[{}]", objects.join(","));
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&joined) {
        return items;
    }

    objects
        .into_iter()
        .filter_map(|object| match serde_json::from_str::<Value>(object) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "Skipping unparseable object in oracle response");
                None
            }
        })
        .collect()
}

fn validate_elements(elements: Vec<Value>, raw: &str) -> Result<Vec<AssessmentResult>, ParseError> {
    if elements.is_empty() {
        return Ok(Vec::new());
    }

    let total = elements.len();
    let mut seen = HashSet::new();
    let mut results = Vec::with_capacity(total);

    for (index, element) in elements.into_iter().enumerate() {
        let result = match validate_element(element) {
            Ok(result) => result,
            Err(e) => {
                warn!(index, error = %e, "Dropping malformed assessment element");
                continue;
            }
        };

        if !seen.insert(result.control_id.clone()) {
            let e = ValidationError::DuplicateControlId(result.control_id);
            warn!(index, error = %e, "Dropping duplicate assessment element");
            continue;
        }

        if result.missing_remediation() {
            warn!(
                control_id = %result.control_id,
                "Failed control has no remediation steps"
            );
        }

        results.push(result);
    }

    if results.is_empty() {
        return Err(ParseError::new(
            format!("None of the {} elements in the oracle response were valid", total),
            raw,
        ));
    }

    Ok(results)
}

/// Check one element and convert it. Requires `control_id` and a recognised
/// `status`; every other field is optional and copied only if present.
pub fn validate_element(element: Value) -> Result<AssessmentResult, ValidationError> {
    let Value::Object(mut map) = element else {
        return Err(ValidationError::NotAnObject);
    };

    let control_id = match map.get("control_id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        _ => return Err(ValidationError::MissingControlId),
    };

    let status = match map.get("status") {
        Some(Value::String(s)) => {
            AssessmentStatus::from_str(s).ok_or_else(|| ValidationError::UnknownStatus {
                control_id: control_id.clone(),
                status: s.clone(),
            })?
        }
        None | Some(Value::Null) => return Err(ValidationError::MissingStatus(control_id)),
        Some(other) => {
            return Err(ValidationError::UnknownStatus {
                control_id,
                status: other.to_string(),
            })
        }
    };

    let severity = match map.get("severity") {
        Some(Value::String(s)) => {
            let severity = Severity::from_str(s);
            if severity.is_none() {
                warn!(control_id = %control_id, severity = %s, "Unrecognised severity ignored");
            }
            severity
        }
        _ => None,
    };

    Ok(AssessmentResult {
        control_name: string_field(&map, "control_name"),
        remediation_steps: remediation_field(&map),
        evidence: map.remove("evidence").unwrap_or(Value::Null),
        control_id,
        status,
        severity,
    })
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

// A list of steps is joined one per line
fn remediation_field(map: &Map<String, Value>) -> Option<String> {
    match map.get("remediation_steps") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(steps)) => {
            let lines: Vec<&str> = steps.iter().filter_map(Value::as_str).collect();
            if lines.is_empty() {
                None
            } else {
                Some(lines.join("\n"))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::plain(r#"[{"control_id":"A","status":"passed"}]"#, 1)]
    #[case::fenced("```json\n[{\"control_id\":\"X\",\"status\":\"failed\",\"severity\":\"high\"}]\n```", 1)]
    #[case::fenced_untagged("```\n[{\"control_id\":\"X\",\"status\":\"passed\"}]\n```", 1)]
    #[case::prose(r#"Here is the assessment: [{"control_id":"A","status":"passed"},{"control_id":"B","status":"failed"}] Let me know!"#, 2)]
    #[case::trailing_comma(r#"[{"control_id":"A","status":"passed"},]"#, 1)]
    #[case::nested_trailing_comma(r#"[{"control_id":"A","status":"passed","evidence":{"k":[1,2,],},},]"#, 1)]
    #[case::truncated(r#"[{"control_id":"A","control_name":"n","status":"passed"}, {"control_id":"B","status":"fail"#, 1)]
    #[case::truncated_fence("```json\n[{\"control_id\":\"A\",\"status\":\"passed\"},{\"control_id\":\"B\",\"status\":\"failed\"},{\"contr", 2)]
    #[case::bare_objects(r#"{"control_id":"A","status":"passed"} {"control_id":"B","status":"passed"}"#, 2)]
    #[case::empty_array("[]", 0)]
    fn test_parse_recovers(#[case] raw: &str, #[case] expected: usize) {
        let results = ResponseRecoveryParser::parse(raw).unwrap();
        assert_eq!(results.len(), expected);
    }

    #[rstest]
    #[case::refusal("Sorry, I cannot comply.")]
    #[case::empty("   ")]
    #[case::truncated_first_object(r#"[{"control_id":"A","stat"#)]
    #[case::all_malformed(r#"[{"status":"passed"},{"control_id":"B"}, 42]"#)]
    #[case::scalar("42")]
    fn test_parse_fails(#[case] raw: &str) {
        assert!(ResponseRecoveryParser::parse(raw).is_err());
    }

    #[test]
    fn test_truncated_keeps_exactly_complete_object() {
        let raw = r#"[{"control_id":"A","control_name":"n","status":"passed"}, {"control_id":"B","status":"fail"#;
        let results = ResponseRecoveryParser::parse(raw).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].control_id, "A");
        assert_eq!(results[0].control_name.as_deref(), Some("n"));
        assert_eq!(results[0].status, AssessmentStatus::Passed);
    }

    #[test]
    fn test_parse_error_carries_snippet() {
        let raw = "Sorry, I cannot comply.";
        let err = ResponseRecoveryParser::parse(raw).unwrap_err();
        assert_eq!(err.snippet, raw);
    }

    #[test]
    fn test_malformed_elements_dropped_individually() {
        let raw = r#"[
            {"control_id":"A","status":"passed"},
            {"control_id":"B","status":"maybe"},
            {"status":"failed"},
            "not an object",
            {"control_id":"C","status":"failed","severity":"critical","remediation_steps":"Rotate keys"}
        ]"#;
        let results = ResponseRecoveryParser::parse(raw).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.control_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn test_duplicate_control_keeps_first() {
        let raw = r#"[{"control_id":"A","status":"passed"},{"control_id":"A","status":"failed"}]"#;
        let results = ResponseRecoveryParser::parse(raw).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, AssessmentStatus::Passed);
    }

    #[test]
    fn test_severity_never_invented() {
        let raw = r#"[{"control_id":"A","status":"failed"},{"control_id":"B","status":"failed","severity":"catastrophic"}]"#;
        let results = ResponseRecoveryParser::parse(raw).unwrap();
        assert!(results.iter().all(|r| r.severity.is_none()));
    }

    #[test]
    fn test_validate_element_full() {
        let element = json!({
            "control_id": "SEC01",
            "control_name": "Root MFA",
            "status": "FAILED",
            "severity": "Critical",
            "evidence": {"account": "123456789012", "mfa": false},
            "remediation_steps": ["Enable MFA on root", "Remove root access keys"]
        });
        let result = validate_element(element).unwrap();
        assert_eq!(result.status, AssessmentStatus::Failed);
        assert_eq!(result.severity, Some(Severity::Critical));
        assert_eq!(result.evidence["mfa"], json!(false));
        assert_eq!(
            result.remediation_steps.as_deref(),
            Some("Enable MFA on root\nRemove root access keys")
        );
    }

    #[test]
    fn test_validate_element_errors() {
        assert_eq!(validate_element(json!([1])), Err(ValidationError::NotAnObject));
        assert_eq!(
            validate_element(json!({"control_id": "  ", "status": "passed"})),
            Err(ValidationError::MissingControlId)
        );
        assert_eq!(
            validate_element(json!({"control_id": "A"})),
            Err(ValidationError::MissingStatus("A".to_string()))
        );
        assert!(matches!(
            validate_element(json!({"control_id": "A", "status": true})),
            Err(ValidationError::UnknownStatus { .. })
        ));
    }

    #[test]
    fn test_truncated_after_nested_array() {
        // the last `]` closes an evidence list, not the outer array
        let raw = r#"[{"control_id":"A","status":"passed","evidence":{"ids":[1,2]}},{"control_id":"B","status":"passed"},{"control_id":"C","evidence":["x"]"#;
        let results = ResponseRecoveryParser::parse(raw).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.control_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_internally_broken_object_skipped_in_salvage() {
        // braces balance but the middle object is not valid JSON
        let raw = r#"[{"control_id":"A","status":"passed"}, {"control_id": oops}, {"control_id":"C","status":"passed"}, {"x"#;
        let results = ResponseRecoveryParser::parse(raw).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.control_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }
}
