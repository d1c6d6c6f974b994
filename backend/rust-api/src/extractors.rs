use axum::{
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::error::ApiError;

/// JSON body extractor that also runs `validator` rules.
///
/// Both malformed JSON and failed validation come back as JSON 400s.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let value = match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => value,
            Err(rejection) => {
                let message = format!("Failed to parse JSON request body: {}", rejection);
                tracing::warn!("{}", message);
                return Err(ApiError::bad_request(message).into_response());
            }
        };

        if let Err(errors) = value.validate() {
            tracing::warn!("Rejected request body: {}", errors);
            return Err(ApiError::from(errors).into_response());
        }

        Ok(ValidatedJson(value))
    }
}
