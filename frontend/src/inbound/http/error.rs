//! HTTP mapping for [`ApiError`].
//!
//! The edge answers with the same `{message, status}` body the backend uses,
//! so front-end code parses proxy failures exactly like backend failures.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use crate::domain::ApiError;

/// Convenient result alias for edge handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}
