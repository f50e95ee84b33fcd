use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::views::layout::url_encode;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Response offering `bytes` as a download named `filename`.
///
/// The name goes out both as a plain ASCII fallback and as an RFC 5987
/// `filename*` so non-Latin names survive.
pub fn attachment(filename: &str, content_type: &'static str, bytes: Vec<u8>) -> Response {
    let fallback: String = filename
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' })
        .collect();
    let disposition = format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        url_encode(filename)
    );

    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}
