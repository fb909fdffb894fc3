//! Request inspection helpers

use hyper::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};

use crate::logger;

/// Strip a single trailing slash so `/abc/` routes like `/abc`
pub fn normalize_path(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Declared body length, if the header is present and well-formed
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(CONTENT_LENGTH)?;
    let Ok(size_str) = value.to_str() else {
        logger::log_warning("Content-Length header contains non-ASCII characters");
        return None;
    };
    match size_str.trim().parse::<u64>() {
        Ok(size) => Some(size),
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
    }
}

/// Whether the request declares an `application/json` body.
///
/// Parameters such as `charset` are ignored. Structured-syntax types like
/// `application/vnd.api+json` do not count.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/8108255/"), "/8108255");
        assert_eq!(normalize_path("/8108255"), "/8108255");
        assert_eq!(normalize_path("/a//"), "/a/");
    }

    #[test]
    fn test_content_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_length(&headers), None);
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("42"));
        assert_eq!(content_length(&headers), Some(42));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("abc"));
        assert_eq!(content_length(&headers), None);
    }

    #[test]
    fn test_json_content_type() {
        let mut headers = HeaderMap::new();
        assert!(!is_json_content_type(&headers));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert!(is_json_content_type(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("Application/JSON"));
        assert!(is_json_content_type(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/vnd.api+json"));
        assert!(!is_json_content_type(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json_content_type(&headers));
    }
}
