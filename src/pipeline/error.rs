use serde::Serialize;
use thiserror::Error;

use crate::{clients::ClientError, model::Collection};

/// Externally observable failure category of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidRequest,
    GenerationUnavailable,
    MalformedConcept,
    AuthenticationExpired,
    CatalogUnavailable,
    NoMatchesFound,
    CollectionCreateFailed,
    TrackAppendFailed,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::GenerationUnavailable => "generation_unavailable",
            Self::MalformedConcept => "malformed_concept",
            Self::AuthenticationExpired => "authentication_expired",
            Self::CatalogUnavailable => "catalog_unavailable",
            Self::NoMatchesFound => "no_matches_found",
            Self::CollectionCreateFailed => "collection_create_failed",
            Self::TrackAppendFailed => "track_append_failed",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage that observed a rejected credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStage {
    Resolving,
    Assembling,
}

/// Every way a run can fail, carrying the diagnostics kept for logs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("concept generation unavailable")]
    GenerationUnavailable {
        #[source]
        source: ClientError,
    },
    #[error("generated concept is malformed ({} validation errors)", .errors.len())]
    MalformedConcept { raw: String, errors: Vec<String> },
    #[error("catalog credential rejected while {stage:?}")]
    AuthenticationExpired {
        stage: CredentialStage,
        #[source]
        source: ClientError,
    },
    #[error("catalog search credential unavailable")]
    CatalogUnavailable {
        #[source]
        source: ClientError,
    },
    #[error("none of the {requested} recommended tracks were found in the catalog")]
    NoMatchesFound { requested: usize },
    #[error("failed to create playlist")]
    CollectionCreateFailed {
        #[source]
        source: ClientError,
    },
    #[error("playlist {} created but adding tracks failed", .collection.id)]
    TrackAppendFailed {
        collection: Collection,
        #[source]
        source: ClientError,
    },
}

impl PipelineError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidRequest(_) => FailureKind::InvalidRequest,
            Self::GenerationUnavailable { .. } => FailureKind::GenerationUnavailable,
            Self::MalformedConcept { .. } => FailureKind::MalformedConcept,
            Self::AuthenticationExpired { .. } => FailureKind::AuthenticationExpired,
            Self::CatalogUnavailable { .. } => FailureKind::CatalogUnavailable,
            Self::NoMatchesFound { .. } => FailureKind::NoMatchesFound,
            Self::CollectionCreateFailed { .. } => FailureKind::CollectionCreateFailed,
            Self::TrackAppendFailed { .. } => FailureKind::TrackAppendFailed,
        }
    }

    /// Message safe to hand back to the caller; never includes upstream bodies or
    /// generator output.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest(detail) => detail.clone(),
            Self::AuthenticationExpired {
                stage: CredentialStage::Assembling,
                ..
            } => "Spotify rejected the access token; sign in again and retry.".to_string(),
            Self::AuthenticationExpired {
                stage: CredentialStage::Resolving,
                ..
            } => "Spotify search authorization expired; retry the request.".to_string(),
            Self::NoMatchesFound { .. } => {
                "No songs found on Spotify for the given mood.".to_string()
            }
            Self::CatalogUnavailable { .. } => {
                "Spotify catalog search is temporarily unavailable.".to_string()
            }
            Self::GenerationUnavailable { .. }
            | Self::MalformedConcept { .. }
            | Self::CollectionCreateFailed { .. }
            | Self::TrackAppendFailed { .. } => {
                "Failed to create the Spotify playlist.".to_string()
            }
        }
    }

    /// The partially created playlist, when one was left behind.
    #[must_use]
    pub fn orphaned_collection(&self) -> Option<&Collection> {
        match self {
            Self::TrackAppendFailed { collection, .. } => Some(collection),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use rstest::rstest;

    fn unauthorized() -> ClientError {
        ClientError::Unauthorized {
            service: "spotify-search",
            status: StatusCode::UNAUTHORIZED,
        }
    }

    #[rstest]
    #[case(FailureKind::InvalidRequest, "\"invalid_request\"")]
    #[case(FailureKind::NoMatchesFound, "\"no_matches_found\"")]
    #[case(FailureKind::TrackAppendFailed, "\"track_append_failed\"")]
    fn kind_serializes_snake_case(#[case] kind: FailureKind, #[case] expected: &str) {
        assert_eq!(serde_json::to_string(&kind).expect("serialize"), expected);
        assert_eq!(format!("\"{kind}\""), expected);
    }

    #[test]
    fn public_message_hides_upstream_detail() {
        let error = PipelineError::CollectionCreateFailed {
            source: ClientError::Status {
                service: "spotify-playlists",
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "stack trace from upstream".to_string(),
            },
        };
        assert!(!error.public_message().contains("stack trace"));

        let malformed = PipelineError::MalformedConcept {
            raw: "Sure! Here is your playlist".to_string(),
            errors: vec!["not json".to_string()],
        };
        assert!(!malformed.public_message().contains("Sure!"));
    }

    #[test]
    fn expired_search_credential_does_not_ask_user_to_sign_in() {
        let search = PipelineError::AuthenticationExpired {
            stage: CredentialStage::Resolving,
            source: unauthorized(),
        };
        let playlist = PipelineError::AuthenticationExpired {
            stage: CredentialStage::Assembling,
            source: unauthorized(),
        };

        assert_eq!(search.kind(), FailureKind::AuthenticationExpired);
        assert!(!search.public_message().contains("sign in"));
        assert!(playlist.public_message().contains("sign in"));
    }

    #[test]
    fn append_failure_keeps_collection() {
        let collection = Collection {
            id: "pl-1".to_string(),
            external_url: "https://open.spotify.com/playlist/pl-1".to_string(),
        };
        let error = PipelineError::TrackAppendFailed {
            collection: collection.clone(),
            source: unauthorized(),
        };

        assert_eq!(error.kind(), FailureKind::TrackAppendFailed);
        assert_eq!(error.orphaned_collection(), Some(&collection));
        assert!(error.to_string().contains("pl-1"));
    }
}
