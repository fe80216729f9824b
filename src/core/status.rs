//! ESITO interpretation.

use crate::utils::error::{BrtError, Result};
use serde_json::Value;

pub const ESITO_OK: i64 = 0;
/// Unknown language, the service answered in Italian.
pub const ESITO_LANGUAGE_FALLBACK: i64 = 2;
/// End of data for paginated legend calls.
pub const ESITO_DATA_FINISHED: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Continuation,
    Failure { code: i64, reason: String },
}

pub fn reason_for(code: i64) -> String {
    let known = match code {
        -1 => "Generic/unknown error",
        -3 => "DB connection error",
        -10 => "Missing BRT shipment id",
        -11 => "Shipment not found",
        -20 => "Missing sender numeric reference",
        -21 => "Missing client id",
        -22 => "Multiple shipments found",
        -30 => "Missing parcel id",
        100 => "Data finished",
        2 => "Unknown language; IT used",
        _ => return format!("BRT error ESITO={}", code),
    };
    known.to_string()
}

pub fn interpret(code: i64, allow_continuation: bool) -> Outcome {
    match code {
        ESITO_OK | ESITO_LANGUAGE_FALLBACK => Outcome::Success,
        ESITO_DATA_FINISHED if allow_continuation => Outcome::Continuation,
        _ => Outcome::Failure {
            code,
            reason: reason_for(code),
        },
    }
}

impl Outcome {
    pub fn into_result(self) -> Result<Outcome> {
        match self {
            Outcome::Failure { code, reason } => Err(BrtError::Outcome { code, reason }),
            other => Ok(other),
        }
    }
}

/// Reads `ESITO` from a raw response. The SOAP layer hands back text, stubs
/// may hand back numbers; both are accepted.
pub fn outcome_code(response: &Value) -> Result<i64> {
    let raw = response
        .get("ESITO")
        .ok_or_else(|| BrtError::transport("response carries no ESITO field"))?;

    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| BrtError::transport(format!("ESITO is not an integer: {}", raw)))
}

/// Reads and interprets the outcome of a response in one step.
pub fn check(response: &Value, allow_continuation: bool) -> Result<Outcome> {
    let code = outcome_code(response)?;
    let outcome = interpret(code, allow_continuation);
    if let Outcome::Failure { code, reason } = &outcome {
        tracing::debug!(esito = code, %reason, "BRT returned a failure outcome");
    }
    outcome.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_codes() {
        assert_eq!(interpret(0, false), Outcome::Success);
        assert_eq!(interpret(2, false), Outcome::Success);
        assert_eq!(interpret(0, true), Outcome::Success);
    }

    #[test]
    fn test_continuation_only_when_allowed() {
        assert_eq!(interpret(100, true), Outcome::Continuation);
        assert_eq!(
            interpret(100, false),
            Outcome::Failure {
                code: 100,
                reason: "Data finished".to_string()
            }
        );
    }

    #[test]
    fn test_mapped_and_unmapped_failures() {
        assert_eq!(
            interpret(-11, false),
            Outcome::Failure {
                code: -11,
                reason: "Shipment not found".to_string()
            }
        );

        match interpret(-999, false) {
            Outcome::Failure { code, reason } => {
                assert_eq!(code, -999);
                assert!(reason.contains("-999"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_outcome_code_accepts_text_and_numbers() {
        assert_eq!(outcome_code(&json!({"ESITO": "0"})).unwrap(), 0);
        assert_eq!(outcome_code(&json!({"ESITO": " -22 "})).unwrap(), -22);
        assert_eq!(outcome_code(&json!({"ESITO": 100})).unwrap(), 100);
        assert!(matches!(
            outcome_code(&json!({"SPEDIZIONE_ID": "1"})),
            Err(BrtError::Transport { .. })
        ));
        assert!(outcome_code(&json!({"ESITO": "abc"})).is_err());
    }

    #[test]
    fn test_check_converts_failure_into_error() {
        let err = check(&json!({"ESITO": -21}), false).unwrap_err();
        assert_eq!(err.code(), Some(-21));
        assert_eq!(err.to_string(), "Missing client id");

        assert_eq!(
            check(&json!({"ESITO": 100}), true).unwrap(),
            Outcome::Continuation
        );
    }
}
