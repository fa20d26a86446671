use crate::error::{AppError, RouteError};
use axum::{
    Json,
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

/// JSON request body whose failures answer with `400 {error}`.
///
/// A request without a JSON body (empty, or not declared as JSON) yields
/// `T::default()`, so the handler's own presence checks decide what is missing.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let route = req.uri().path().to_owned();
        let declared_json = is_json_content_type(&req);

        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            // Oversized bodies keep their 413
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                rejection.into_response()
            } else {
                invalid_body(route.clone(), rejection.body_text())
            }
        })?;

        if !declared_json || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(T::default()));
        }

        let Json(value) =
            Json::<T>::from_bytes(&bytes).map_err(|e| invalid_body(route, e.body_text()))?;
        Ok(JsonBody(value))
    }
}

fn is_json_content_type(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

fn invalid_body(route: String, reason: String) -> Response {
    RouteError::new(
        route,
        "Invalid request body",
        AppError::Validation(format!("invalid JSON body: {reason}")),
    )
    .into_response()
}
