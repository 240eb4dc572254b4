use axum::{http::{header, HeaderValue, StatusCode}, response::{IntoResponse, Response}};

macro_rules! export_file_name {
    () => {
        "testing_instructions.txt"
    };
}

pub const EXPORT_FILE_NAME: &str = export_file_name!();
pub const EXPORT_MIME_TYPE: &str = "text/plain";

/// Plain-text download of a generated guide.
pub fn attachment(instructions: String) -> Response {
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static(concat!("attachment; filename=\"", export_file_name!(), "\"")),
    );
    (StatusCode::OK, headers, instructions).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn attachment_sets_download_headers_and_body() {
        let resp = attachment("1. *Description*: login".to_string());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"{EXPORT_FILE_NAME}\"").as_str()
        );
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"1. *Description*: login");
    }

    #[test]
    fn content_type_starts_with_export_mime() {
        let resp = attachment(String::new());
        let ct = resp.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(ct.starts_with(EXPORT_MIME_TYPE));
    }
}
