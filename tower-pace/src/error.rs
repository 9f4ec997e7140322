use std::time::Duration;

use tower::BoxError;

/// Errors produced by the throttling middleware.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaceError {
    /// The request arrived while the cooldown window was open and was dropped.
    ///
    /// When the `axum` feature is enabled, this converts to `429 Too Many Requests`
    /// with a `Retry-After` header.
    #[error("Throttled; retry after {retry_after:?}")]
    Throttled {
        /// Time left until the window reopens.
        retry_after: Duration,
    },

    /// An error raised by the inner service.
    ///
    /// The string contains the `Display` representation of the inner error.
    /// When the `axum` feature is enabled, this converts to `500 Internal Server Error`.
    #[error("Internal service error: {0}")]
    Inner(String),
}

impl PaceError {
    /// Recovers a `PaceError` from the boxed error a throttled service returns.
    pub fn from_boxed(err: BoxError) -> Self {
        match err.downcast::<PaceError>() {
            Ok(pace_err) => *pace_err,
            Err(other) => Self::Inner(other.to_string()),
        }
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for PaceError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, header) = match self {
            Self::Throttled { retry_after } => {
                // Round up so clients never retry while the window is still open.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                let val = axum::http::HeaderValue::from(secs.max(1));
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Some((axum::http::header::RETRY_AFTER, val)),
                )
            }
            Self::Inner(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        let mut response = (status, self.to_string()).into_response();
        if let Some((name, value)) = header {
            response.headers_mut().insert(name, value);
        }
        response
    }
}
