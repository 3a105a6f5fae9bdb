//! Request helpers shared by the handlers.

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, header};
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::api::error::ApiError;

/// Accept `application/json`, with or without parameters such as
/// `charset`. Look-alikes (`application/jsonp`, `text/json`) are rejected.
pub fn parse_content_type(value: &str) -> Result<mime::Mime, ApiError> {
    let parsed = value
        .parse::<mime::Mime>()
        .map_err(|_| ApiError::InvalidPayload(format!("malformed Content-Type {value:?}")))?;

    if parsed.essence_str() != mime::APPLICATION_JSON.essence_str() {
        return Err(ApiError::InvalidPayload(format!(
            "expected application/json body, got {}",
            parsed.essence_str()
        )));
    }

    Ok(parsed)
}

/// The request must declare a JSON body
pub fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return Err(ApiError::InvalidPayload("missing Content-Type header".into()));
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::InvalidPayload("Content-Type is not visible ASCII".into()))?;

    parse_content_type(value).map(drop)
}

/// Read the whole body, failing once more than `max_bytes` have arrived
///
/// Decompression happens in middleware, so the limit applies to the
/// decoded size.
pub async fn read_body(body: Body, max_bytes: usize) -> Result<Bytes, ApiError> {
    match Limited::new(body, max_bytes).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ApiError::PayloadTooLarge(max_bytes))
        }
        Err(err) => Err(ApiError::InvalidPayload(format!("failed to read body: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_content_type_json_variants() {
        for accepted in [
            "application/json",
            "application/json; charset=utf-8",
            "Application/JSON",
        ] {
            assert!(parse_content_type(accepted).is_ok(), "{accepted}");
        }
    }

    #[test]
    fn test_content_type_look_alikes() {
        for rejected in ["application/jsonp", "text/json", "text/plain", "json", ""] {
            assert!(
                matches!(parse_content_type(rejected), Err(ApiError::InvalidPayload(_))),
                "{rejected}"
            );
        }
    }

    #[test]
    fn test_require_json_header() {
        let mut headers = HeaderMap::new();
        assert!(matches!(require_json(&headers), Err(ApiError::InvalidPayload(_))));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(require_json(&headers).is_ok());
    }

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let bytes = read_body(Body::from(vec![b'a'; 16]), 16).await.unwrap();
        assert_eq!(bytes.len(), 16);
    }

    #[tokio::test]
    async fn test_read_body_too_large() {
        let result = read_body(Body::from(vec![b'a'; 17]), 16).await;
        match result {
            Err(ApiError::PayloadTooLarge(limit)) => assert_eq!(limit, 16),
            other => panic!("Expected PayloadTooLarge error, got {other:?}"),
        }
    }
}
