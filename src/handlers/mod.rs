pub mod auth;
pub mod extract;
pub mod orders;

use actix_web::web;

use crate::domain::errors::DomainError;
use crate::errors::AppError;

/// Run a blocking service call (diesel, argon2) off the async workers.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)
}
