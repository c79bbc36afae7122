use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use tax_core::calculations::{CalculationError, ErrorCategory};

/// Error type for the tax API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Calculation(#[from] CalculationError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Calculation(e) => match e.category() {
                ErrorCategory::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorCategory::NotConfigured => StatusCode::NOT_FOUND,
                ErrorCategory::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let ApiError::Calculation(error) = &self;

        let mut body = Map::new();
        if status.is_server_error() {
            tracing::error!(%error, "request failed");
            body.insert("error".into(), "Internal server error".into());
        } else {
            tracing::debug!(%error, status = status.as_u16(), "request rejected");
            body.insert("error".into(), error.to_string().into());
            if let Some(provided) = error.provided() {
                body.insert("provided".into(), provided.into());
            }
        }

        (status, Json(Value::Object(body))).into_response()
    }
}

/// Helper type for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tax_core::RepositoryError;

    use super::*;

    async fn render(error: CalculationError) -> (StatusCode, Value) {
        let response = ApiError::from(error).into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (status, serde_json::from_slice(&bytes).expect("body should be JSON"))
    }

    #[tokio::test]
    async fn input_errors_are_bad_requests_with_provided_value() {
        let (status, body) = render(CalculationError::NegativeIncome {
            provided: "-10".into(),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "Income must not be negative", "provided": "-10" })
        );
    }

    #[tokio::test]
    async fn missing_parameter_has_no_provided_value() {
        let (status, body) = render(CalculationError::MissingParameter).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing required parameter 'income'" }));
    }

    #[tokio::test]
    async fn missing_brackets_are_not_found() {
        let (status, body) = render(CalculationError::NoBracketsConfigured {
            code: "AUD".into(),
        })
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "No brackets found for currency AUD" }));
    }

    #[tokio::test]
    async fn infrastructure_errors_hide_details() {
        let (status, body) = render(CalculationError::Repository(RepositoryError::Connection(
            "database is locked".into(),
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
