//! JSON body extractor that runs `validator` rules.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use dormhub_core::AppError;

use crate::error::ApiError;

/// A JSON body that passed its validation rules.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        value
            .validate()
            .map_err(|e| AppError::validation(describe(&e)))?;
        Ok(Self(value))
    }
}

/// Flatten field errors into one readable line.
fn describe(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("Invalid value for '{field}'"),
            })
        })
        .collect();
    parts.sort();
    if parts.is_empty() {
        "Invalid request body".to_string()
    } else {
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;
    use dormhub_core::error::ErrorKind;

    use crate::dto::request::LoginRequest;

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let req = json_request(r#"{"email":"ana@dorm.edu","password":"secret"}"#);
        let ValidatedJson(login) = ValidatedJson::<LoginRequest>::from_request(req, &())
            .await
            .unwrap();
        assert_eq!(login.email, "ana@dorm.edu");
    }

    #[tokio::test]
    async fn test_rule_violation_is_validation_error() {
        let req = json_request(r#"{"email":"nope","password":"secret"}"#);
        let err = ValidatedJson::<LoginRequest>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(err.0.kind, ErrorKind::Validation);
        assert_eq!(err.0.message, "A valid email is required");
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let req = json_request("{not json");
        let err = ValidatedJson::<LoginRequest>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(err.0.kind, ErrorKind::Validation);
    }
}
