//! Helpers for JSON requests and responses.

use std::fmt::Display;

use axum::{
    extract::Request,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};

/// Failure reading a JSON request body.
#[derive(Debug, thiserror::Error)]
pub enum JsonIoError {
    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),

    #[error("invalid JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Answers 400 with the error in an `errors` array.
impl IntoResponse for JsonIoError {
    fn into_response(self) -> Response {
        respond_errors(StatusCode::BAD_REQUEST, [self])
    }
}

/// Decode the whole JSON body of `request` into `T`.
///
/// # Errors
///
/// Returns an error if the body cannot be read or is not valid JSON for `T`.
pub async fn unmarshal_request<T>(request: Request) -> Result<T, JsonIoError>
where
    T: DeserializeOwned,
{
    let body = axum::body::to_bytes(request.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Send `value` as a JSON response with the given status.
///
/// If `value` cannot be serialized the response is a plain 500 instead.
pub fn respond<T>(status: StatusCode, value: &T) -> Response
where
    T: Serialize + ?Sized,
{
    match serde_json::to_vec(value) {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize JSON response");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Send one or more errors as `{"errors": [...]}`.
pub fn respond_errors<I, E>(status: StatusCode, errors: I) -> Response
where
    I: IntoIterator<Item = E>,
    E: Display,
{
    let errors: Vec<String> = errors.into_iter().map(|e| e.to_string()).collect();
    respond(status, &serde_json::json!({ "errors": errors }))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct Person {
        #[serde(skip_serializing_if = "String::is_empty", default)]
        name: String,
        #[serde(skip_serializing_if = "is_zero", default)]
        age: u32,
    }

    fn is_zero(n: &u32) -> bool {
        *n == 0
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body extraction");
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    #[tokio::test]
    async fn unmarshal_request_decodes_body() {
        let request = Request::builder()
            .uri("http://example.com/")
            .body(Body::from(r#"{"name":"Foobert", "age":70}"#))
            .unwrap();

        let person: Person = unmarshal_request(request).await.unwrap();
        assert_eq!(person.name, "Foobert");
        assert_eq!(person.age, 70);
    }

    #[tokio::test]
    async fn unmarshal_request_rejects_invalid_json() {
        let request = Request::builder()
            .uri("http://example.com/")
            .body(Body::from("{not json"))
            .unwrap();

        let err = unmarshal_request::<Person>(request).await.unwrap_err();
        assert!(matches!(err, JsonIoError::Decode(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with(r#"{"errors":["invalid JSON body"#));
    }

    #[tokio::test]
    async fn respond_sets_json_content_type() {
        let out = Person {
            name: "Foobert".to_string(),
            age: 70,
        };
        let response = respond(StatusCode::OK, &out);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "application/json"
        );
        assert_eq!(body_text(response).await, r#"{"name":"Foobert","age":70}"#);
    }

    #[tokio::test]
    async fn respond_falls_back_to_500_when_serialization_fails() {
        // JSON object keys must be strings
        let mut unserializable = BTreeMap::new();
        unserializable.insert((1, 2), "value");

        let response = respond(StatusCode::OK, &unserializable);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal Server Error");
    }

    #[tokio::test]
    async fn respond_errors_keeps_order() {
        let response = respond_errors(StatusCode::BAD_REQUEST, ["foo", "bar"]);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "application/json"
        );
        assert_eq!(body_text(response).await, r#"{"errors":["foo","bar"]}"#);
    }
}
