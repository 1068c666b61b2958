use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

use super::api::{error_response, ApiError};

/// Body size limits enforced before a request reaches a handler
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub max_request_size: usize,
    pub max_upload_size: usize,
}

const UPLOAD_PATH_SUFFIX: &str = "/uploadimage";

/// Reject bodies with the wrong content type or an oversized content length
pub async fn request_validation_middleware(
    limits: RequestLimits,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let is_upload = request.uri().path().ends_with(UPLOAD_PATH_SUFFIX);

    validate_content_type(&request, is_upload)?;

    let max_size = if is_upload {
        limits.max_upload_size
    } else {
        limits.max_request_size
    };
    validate_request_size(&request, max_size)?;

    Ok(next.run(request).await)
}

fn validate_content_type(request: &Request<Body>, is_upload: bool) -> Result<(), ApiError> {
    if !matches!(*request.method(), Method::POST | Method::PUT | Method::PATCH) {
        return Ok(());
    }

    let expected = if is_upload {
        "multipart/form-data"
    } else {
        "application/json"
    };

    match request.headers().get(header::CONTENT_TYPE) {
        Some(content_type) => {
            let content_type = content_type.to_str().unwrap_or("");
            if !content_type.starts_with(expected) {
                warn!("Invalid content type: {}", content_type);
                return Err(error_response(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    &format!("Content-Type must be {}", expected),
                ));
            }
            Ok(())
        }
        None => {
            warn!("Missing content type header");
            Err(error_response(
                StatusCode::BAD_REQUEST,
                "Content-Type header is required for requests with body",
            ))
        }
    }
}

fn validate_request_size(request: &Request<Body>, max_size: usize) -> Result<(), ApiError> {
    let length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());

    match length {
        Some(length) if length > max_size => {
            error!("Request too large: {} bytes", length);
            Err(error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                &format!(
                    "Request size {} bytes exceeds maximum of {} bytes",
                    length, max_size
                ),
            ))
        }
        _ => Ok(()),
    }
}

/// Add the usual hardening headers to every response
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::post, Router};
    use tower::ServiceExt;

    const LIMITS: RequestLimits = RequestLimits {
        max_request_size: 64,
        max_upload_size: 1024,
    };

    fn app() -> Router {
        Router::new()
            .route("/order", post(|| async { "ok" }))
            .route("/product/:id/uploadimage", post(|| async { "ok" }))
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(middleware::from_fn(|req, next| {
                request_validation_middleware(LIMITS, req, next)
            }))
    }

    fn post_request(uri: &str, content_type: Option<&str>, length: usize) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_LENGTH, length);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(vec![b'x'; length])).unwrap()
    }

    #[tokio::test]
    async fn test_json_post_accepted() {
        let response = app()
            .oneshot(post_request("/order", Some("application/json"), 10))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    }

    #[tokio::test]
    async fn test_wrong_content_type_rejected() {
        let response = app()
            .oneshot(post_request("/order", Some("text/plain"), 10))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let response = app()
            .oneshot(post_request("/order", None, 10))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_requires_multipart() {
        let response = app()
            .oneshot(post_request(
                "/product/4/uploadimage",
                Some("multipart/form-data; boundary=xyz"),
                10,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app()
            .oneshot(post_request(
                "/product/4/uploadimage",
                Some("application/json"),
                10,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_size_limits_per_route() {
        let response = app()
            .oneshot(post_request("/order", Some("application/json"), 100))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = app()
            .oneshot(post_request(
                "/product/4/uploadimage",
                Some("multipart/form-data; boundary=xyz"),
                100,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
