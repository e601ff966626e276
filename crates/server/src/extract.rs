//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::AppError;

/// JSON body extractor whose rejections use the API's `{"detail": ...}` shape.
///
/// Axum's own `Json` answers malformed bodies in plain text, which the
/// frontend cannot parse.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(ApiJson(request): ApiJson<CheckoutRequest>) -> impl IntoResponse {
///     request.pack_id
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
