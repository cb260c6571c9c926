//! Strict decoding of generator output into a [`PlaylistConcept`].
use serde::Deserialize;
use serde_json::Value;

use super::error::PipelineError;
use crate::{
    model::{PlaylistConcept, TrackRef},
    schema::{concept::concept_schema, validate_json},
};

#[derive(Debug, Deserialize)]
struct RawConcept {
    playlist_title: String,
    playlist_description: String,
    tracks: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    track_name: String,
    artist_name: String,
}

/// Accepts exactly one JSON object matching the concept schema and nothing else.
#[derive(Debug, Clone)]
pub struct ConceptParser {
    schema: Value,
}

impl ConceptParser {
    #[must_use]
    pub fn new(max_tracks: usize) -> Self {
        Self {
            schema: concept_schema(max_tracks.max(1)),
        }
    }

    /// # Errors
    /// Returns [`PipelineError::MalformedConcept`] with the raw text and every
    /// problem found. Concepts are rejected, never repaired.
    pub fn parse(&self, raw: &str) -> Result<PlaylistConcept, PipelineError> {
        let malformed = |errors: Vec<String>| PipelineError::MalformedConcept {
            raw: raw.to_string(),
            errors,
        };

        // Surrounding whitespace is tolerated; prose, fences or a second value are not.
        let value: Value =
            serde_json::from_str(raw).map_err(|error| malformed(vec![error.to_string()]))?;

        let validation = validate_json(&self.schema, &value);
        if !validation.valid {
            return Err(malformed(validation.errors));
        }

        let concept: RawConcept =
            serde_json::from_value(value).map_err(|error| malformed(vec![error.to_string()]))?;

        let tracks = concept
            .tracks
            .into_iter()
            .map(|track| TrackRef::new(track.track_name.trim(), track.artist_name.trim()))
            .collect();

        Ok(PlaylistConcept::new(
            concept.playlist_title.trim().to_string(),
            concept.playlist_description.trim().to_string(),
            tracks,
        ))
    }
}
