use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::de::DeserializeOwned;

use crate::{database::StoreError, error::AppError};

/// JSON body whose rejection is answered with the API error envelope instead
/// of axum's plain text.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::MalformedPayload(rejection.body_text()))?;

        Ok(Payload(value))
    }
}

/// Maps a unique index collision to a 400 with `message`; other store errors
/// pass through.
pub fn on_duplicate(message: String) -> impl FnOnce(StoreError) -> AppError {
    move |err| match err {
        StoreError::Duplicate { .. } => AppError::Conflict(message),
        other => AppError::Store(other),
    }
}

pub fn created<T>(body: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_duplicate() {
        let err = on_duplicate("Vendor \"A\" already exists.".to_string())(StoreError::Duplicate {
            collection: "vendors",
            key: "A".to_string(),
        });

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
