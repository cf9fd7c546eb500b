use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::DuplicateEmail
            | DomainError::InvalidCredentials
            | DomainError::InvalidInput(_) => AppError::BadRequest(e.to_string()),
            // The cause was already logged when the token was rejected.
            DomainError::InvalidToken(_) => {
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            DomainError::Unauthorized => AppError::Unauthorized(e.to_string()),
            DomainError::NotFound(_) => AppError::NotFound(e.to_string()),
            DomainError::InvalidTransition { .. } | DomainError::OrderClosed(_) => {
                AppError::Conflict(e.to_string())
            }
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::Internal(msg) => {
                log::error!("Internal server error: {}", msg);
                builder.json(serde_json::json!({
                    "error": "Internal server error"
                }))
            }
            AppError::Unauthorized(_) => builder
                .insert_header(("WWW-Authenticate", "Bearer"))
                .json(serde_json::json!({
                    "error": self.to_string()
                })),
            _ => builder.json(serde_json::json!({
                "error": self.to_string()
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use actix_web::ResponseError;

    fn status_of(e: DomainError) -> StatusCode {
        AppError::from(e).error_response().status()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(status_of(DomainError::NotFound("Order")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(DomainError::NotFound("Order item")),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn credential_and_signup_failures_return_400() {
        assert_eq!(status_of(DomainError::DuplicateEmail), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(DomainError::InvalidCredentials),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::InvalidInput("quantity".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn token_and_ownership_failures_return_401() {
        let resp = AppError::from(DomainError::Unauthorized).error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers()
                .get("WWW-Authenticate")
                .and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );
        assert_eq!(
            status_of(DomainError::InvalidToken("ExpiredSignature".to_string())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn invalid_token_hides_the_cause() {
        let err = AppError::from(DomainError::InvalidToken("InvalidSignature".to_string()));
        assert_eq!(err.to_string(), "Invalid or expired token");
    }

    #[test]
    fn closed_orders_return_409() {
        assert_eq!(
            status_of(DomainError::OrderClosed(OrderStatus::Canceled)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::InvalidTransition {
                from: OrderStatus::Finalized,
                to: OrderStatus::Canceled
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_display() {
        assert_eq!(
            AppError::Internal("msg".to_string()).to_string(),
            "Internal error: msg"
        );
    }

    #[test]
    fn domain_internal_maps_to_app_internal() {
        let app_err: AppError = DomainError::Internal("oops".to_string()).into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }
}
