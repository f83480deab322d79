// Route handlers. Every handler reads the per-request context through the
// `AppContext` extractor; access control has already run by the time they execute.
pub mod health;
pub mod pages;
pub mod session;

use crate::error::ApiError;

pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
