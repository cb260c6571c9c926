use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::pipeline::{FailureKind, PipelineError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_kind: FailureKind,
    message: String,
}

/// A failed run rendered for the caller.
#[derive(Debug)]
pub(crate) struct ApiError(pub(crate) PipelineError);

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        Self(error)
    }
}

pub(crate) fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::InvalidRequest => StatusCode::BAD_REQUEST,
        FailureKind::AuthenticationExpired => StatusCode::UNAUTHORIZED,
        FailureKind::NoMatchesFound => StatusCode::NOT_FOUND,
        FailureKind::CatalogUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        FailureKind::GenerationUnavailable
        | FailureKind::MalformedConcept
        | FailureKind::CollectionCreateFailed
        | FailureKind::TrackAppendFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let body = ErrorBody {
            error_kind: kind,
            message: self.0.public_message(),
        };
        (status_for(kind), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FailureKind::InvalidRequest, 400)]
    #[case(FailureKind::AuthenticationExpired, 401)]
    #[case(FailureKind::NoMatchesFound, 404)]
    #[case(FailureKind::CatalogUnavailable, 503)]
    #[case(FailureKind::GenerationUnavailable, 500)]
    #[case(FailureKind::MalformedConcept, 500)]
    #[case(FailureKind::CollectionCreateFailed, 500)]
    #[case(FailureKind::TrackAppendFailed, 500)]
    fn kinds_map_to_statuses(#[case] kind: FailureKind, #[case] status: u16) {
        assert_eq!(status_for(kind).as_u16(), status);
    }
}
