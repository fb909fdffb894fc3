// API response body types
// Field names and shapes match what existing clients of the course API parse

use serde::Serialize;
use serde_json::Value;

use crate::courses::Course;

/// Message returned when an id lookup misses
pub const NOT_FOUND_MSG: &str = "Id no Existe";

/// `GET /` body
#[derive(Debug, Serialize)]
pub struct CourseListResponse<'a> {
    pub state: bool,
    pub data: &'a [Course],
}

/// `GET /{id}` body on a hit
#[derive(Debug, Serialize)]
pub struct CourseFoundResponse<'a> {
    pub state: bool,
    pub data: &'a Course,
}

/// `GET /{id}` body on a miss
#[derive(Debug, Serialize)]
pub struct LookupFailedResponse {
    pub state: bool,
    pub msg: &'static str,
}

impl LookupFailedResponse {
    pub const fn not_found() -> Self {
        Self {
            state: false,
            msg: NOT_FOUND_MSG,
        }
    }
}

/// `POST /` body: the three course fields copied from the request as-is.
///
/// A field missing from the request stays missing here; an explicit `null`
/// is echoed back as `null`.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct CourseEcho {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<Value>,
}

impl CourseEcho {
    /// Project the course fields out of an arbitrary JSON payload
    pub fn project(payload: &Value) -> Self {
        Self {
            id: payload.get("id").cloned(),
            name: payload.get("name").cloned(),
            credits: payload.get("credits").cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_echo_keeps_values_untyped() {
        let payload = json!({"id": 12, "name": ["x"], "credits": "two", "extra": true});
        let echo = CourseEcho::project(&payload);
        assert_eq!(
            serde_json::to_value(&echo).unwrap(),
            json!({"id": 12, "name": ["x"], "credits": "two"})
        );
    }

    #[test]
    fn test_echo_missing_vs_null() {
        let echo = CourseEcho::project(&json!({"id": "1", "credits": null}));
        assert_eq!(
            serde_json::to_string(&echo).unwrap(),
            r#"{"id":"1","credits":null}"#
        );
    }

    #[test]
    fn test_echo_from_non_object() {
        assert_eq!(CourseEcho::project(&json!([1, 2])), CourseEcho::default());
    }

    #[test]
    fn test_not_found_shape() {
        assert_eq!(
            serde_json::to_string(&LookupFailedResponse::not_found()).unwrap(),
            r#"{"state":false,"msg":"Id no Existe"}"#
        );
    }
}
