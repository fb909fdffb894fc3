//! HTTP protocol layer module
//!
//! Response builders and request helpers shared by the API router,
//! decoupled from the course endpoints themselves.

pub mod request;
pub mod response;

// Re-export commonly used types
pub use request::{content_length, is_json_content_type, normalize_path};
pub use response::{
    apply_common_headers, body_len, build_400_response, build_404_response, build_405_response,
    build_413_response, build_html_response, build_options_response, strip_body_for_head,
};
