// Course endpoint handlers module

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Response, StatusCode};
use serde_json::{Map, Value};

use super::response::json_response;
use super::types::{CourseEcho, CourseFoundResponse, CourseListResponse, LookupFailedResponse};
use crate::courses::CourseStore;
use crate::http;
use crate::logger;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// `GET /` - every course in seed order
pub fn handle_list(store: &CourseStore) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &CourseListResponse {
            state: true,
            data: store.list_all(),
        },
    )
}

/// `GET /{id}` - exact id lookup
///
/// A hit answers 201 and a miss answers 401; existing clients key off these
/// codes, so they are not the conventional 200/404.
pub fn handle_get(store: &CourseStore, id: &str) -> Response<Full<Bytes>> {
    match store.find_by_id(id) {
        Some(course) => json_response(
            StatusCode::CREATED,
            &CourseFoundResponse {
                state: true,
                data: course,
            },
        ),
        None => {
            logger::log_debug(&format!("Course lookup miss: {id}"));
            json_response(StatusCode::UNAUTHORIZED, &LookupFailedResponse::not_found())
        }
    }
}

/// `POST /` - echo the submitted course fields without storing them
pub fn handle_create(headers: &HeaderMap, body: &Bytes) -> Response<Full<Bytes>> {
    let payload = match parse_json_body(headers, body) {
        Ok(payload) => payload,
        Err(reason) => {
            logger::log_warning(&format!("Rejected request body: {reason}"));
            return http::build_400_response();
        }
    };

    json_response(StatusCode::CREATED, &CourseEcho::project(&payload))
}

/// Parse a request body the way a lenient JSON body parser would.
///
/// Non-JSON content types and empty bodies read as an empty object. A
/// leading UTF-8 byte order mark is skipped. Only objects and arrays are
/// accepted at the top level.
fn parse_json_body(headers: &HeaderMap, body: &Bytes) -> Result<Value, String> {
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(&body[..]);
    if !http::is_json_content_type(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Ok(value),
        Ok(_) => Err("top-level JSON value must be an object or array".to_string()),
        Err(e) => Err(format!("malformed JSON: {e}")),
    }
}
