use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::types::ValidationErrors;

/// Admin service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AdminServiceError {
    #[error("user not found")]
    UserNotFound,
    #[error("identity not found")]
    IdentityNotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("not authenticated")]
    Unauthenticated,
    #[error("validation failed")]
    Validation(ValidationErrors),
    #[error("password didn't match confirmation")]
    PasswordMismatch,
    #[error("old password didn't match")]
    OldPasswordMismatch,
    #[error("invalid pagination: page and count must be at least 1")]
    InvalidPage,
    #[error("unknown association in filter spec: {0}")]
    UnknownAssociation(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<quarterdeck_domain::pagination::InvalidPage> for AdminServiceError {
    fn from(_: quarterdeck_domain::pagination::InvalidPage) -> Self {
        Self::InvalidPage
    }
}

impl AdminServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::IdentityNotFound => "IDENTITY_NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::OldPasswordMismatch => "OLD_PASSWORD_MISMATCH",
            Self::InvalidPage => "INVALID_PAGE",
            Self::UnknownAssociation(_) => "UNKNOWN_ASSOCIATION",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for AdminServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UserNotFound | Self::IdentityNotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Validation(_) | Self::PasswordMismatch | Self::OldPasswordMismatch => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::InvalidPage => StatusCode::BAD_REQUEST,
            // A filter spec naming a missing association is a configuration
            // bug, not caller input. Fail loud.
            Self::UnknownAssociation(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match &self {
            Self::UnknownAssociation(path) => {
                tracing::error!(path = %path, kind = "UNKNOWN_ASSOCIATION", "filter spec misconfiguration");
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, kind = "INTERNAL", "internal error");
            }
            _ => {}
        }
        let body = match &self {
            Self::Validation(errors) => serde_json::json!({
                "kind": self.kind(),
                "message": self.to_string(),
                "errors": errors,
            }),
            _ => serde_json::json!({
                "kind": self.kind(),
                "message": self.to_string(),
            }),
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;

    async fn assert_error(
        error: AdminServiceError,
        expected_status: StatusCode,
        expected_kind: &str,
    ) -> serde_json::Value {
        let resp = error.into_response();
        assert_eq!(resp.status(), expected_status);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["kind"], expected_kind);
        json
    }

    #[tokio::test]
    async fn should_return_user_not_found() {
        assert_error(
            AdminServiceError::UserNotFound,
            StatusCode::NOT_FOUND,
            "USER_NOT_FOUND",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_forbidden() {
        assert_error(
            AdminServiceError::Forbidden,
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_unauthenticated() {
        assert_error(
            AdminServiceError::Unauthenticated,
            StatusCode::UNAUTHORIZED,
            "UNAUTHENTICATED",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_validation_with_field_errors() {
        let mut errors = ValidationErrors::default();
        errors.add("username", "is too short");
        let json = assert_error(
            AdminServiceError::Validation(errors),
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_FAILED",
        )
        .await;
        assert_eq!(json["errors"]["username"][0], "is too short");
    }

    #[tokio::test]
    async fn should_keep_password_mismatch_distinct_from_old_password() {
        assert_error(
            AdminServiceError::PasswordMismatch,
            StatusCode::UNPROCESSABLE_ENTITY,
            "PASSWORD_MISMATCH",
        )
        .await;
        assert_error(
            AdminServiceError::OldPasswordMismatch,
            StatusCode::UNPROCESSABLE_ENTITY,
            "OLD_PASSWORD_MISMATCH",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_invalid_page_as_bad_request() {
        assert_error(
            AdminServiceError::InvalidPage,
            StatusCode::BAD_REQUEST,
            "INVALID_PAGE",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_unknown_association_as_internal() {
        assert_error(
            AdminServiceError::UnknownAssociation("managers.name".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "UNKNOWN_ASSOCIATION",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_internal() {
        assert_error(
            AdminServiceError::Internal(anyhow::anyhow!("db error")),
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
        )
        .await;
    }
}
