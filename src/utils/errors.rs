use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn unauthorized<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNAUTHORIZED, err)
    }

    pub fn forbidden<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::FORBIDDEN, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, err)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.error.to_string()
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_expected_status() {
        assert_eq!(
            AppError::bad_request(anyhow::anyhow!("x")).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::unauthorized(anyhow::anyhow!("x")).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::forbidden(anyhow::anyhow!("x")).status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::not_found(anyhow::anyhow!("x")).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::conflict(anyhow::anyhow!("x")).status,
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn from_any_error_is_internal() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
