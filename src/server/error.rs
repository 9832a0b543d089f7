//! Error responses.
//!
//! Every failure leaves the server as `{success: false, error, message}`
//! with a status code chosen from the error kind.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::{CollectionError, CompileError, Error, ReportError};

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
}

/// Error returned by request handlers.
#[derive(Debug)]
pub enum ApiError {
    /// A domain operation failed.
    Domain(Error),

    /// The request never reached the operation.
    Rejected {
        /// Status to answer with.
        status: StatusCode,
        /// Kind sent as `error`.
        kind: &'static str,
        /// Human-readable reason.
        message: String,
    },
}

impl ApiError {
    /// Rejection of a request that could not be read.
    pub fn rejected(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            kind,
            message: message.into(),
        }
    }

    /// Map a body rejection to `kind`.
    pub fn from_json(kind: &'static str, rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), kind, rejection.body_text())
    }

    /// Map a query string rejection to `kind`.
    pub fn from_query(kind: &'static str, rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), kind, rejection.body_text())
    }

    /// Machine-readable kind sent as `error`.
    pub fn kind(&self) -> &'static str {
        let err = match self {
            Self::Domain(err) => err,
            Self::Rejected { kind, .. } => return *kind,
        };
        match err {
            Error::Collection(CollectionError::Duplicate(_)) => "duplicate",
            Error::Collection(CollectionError::NotFound(_)) => "not_found",
            Error::Collection(CollectionError::Index { .. }) => "index_out_of_range",
            Error::Collection(CollectionError::InvalidIdentifier(_)) => "invalid_identifier",
            Error::Collection(CollectionError::Metadata { .. }) => "metadata_failed",
            Error::Compile(CompileError::EmptyCollection) => "empty_collection",
            Error::Compile(CompileError::Unresolved { .. }) => "unresolved_document",
            Error::Compile(CompileError::InvalidOptions { .. }) => "invalid_options",
            Error::Compile(CompileError::Engine { .. }) => "engine_failed",
            Error::Compile(CompileError::Timeout { .. }) => "timeout",
            Error::Report(ReportError::InvalidIdentifier { .. }) => "invalid_identifier",
            Error::Report(ReportError::Io { .. }) => "internal",
            Error::Report(_) => "unsupported_report",
            Error::InvalidConfig { .. } | Error::Io(_) => "internal",
        }
    }

    /// HTTP status for the error kind.
    pub fn status_code(&self) -> StatusCode {
        let err = match self {
            Self::Domain(err) => err,
            Self::Rejected { status, .. } => return *status,
        };
        match err {
            Error::Collection(CollectionError::Duplicate(_)) => StatusCode::CONFLICT,
            Error::Collection(CollectionError::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::Collection(CollectionError::Metadata { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::Collection(_) => StatusCode::BAD_REQUEST,
            Error::Compile(CompileError::Unresolved { .. }) => StatusCode::NOT_FOUND,
            Error::Compile(CompileError::Engine { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Compile(CompileError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Error::Compile(_) => StatusCode::BAD_REQUEST,
            Error::Report(ReportError::Io { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Report(_) => StatusCode::BAD_REQUEST,
            Error::InvalidConfig { .. } | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Domain(err) => err.to_string(),
            Self::Rejected { message, .. } => message.clone(),
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        Self::Domain(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!(error = %message, kind = self.kind(), "Request failed");
        } else {
            tracing::debug!(error = %message, kind = self.kind(), "Request rejected");
        }

        let body = Json(ErrorResponse {
            success: false,
            error: self.kind(),
            message,
        });

        (status, body).into_response()
    }
}
