//! Contract for the playlist concept returned by the text generator.
use serde_json::{Value, json};

/// Schema of a playlist concept carrying between one and `max_tracks` tracks.
pub(crate) fn concept_schema(max_tracks: usize) -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Playlist Concept",
        "description": "Structured playlist idea generated from a mood description",
        "type": "object",
        "properties": {
            "playlist_title": {
                "type": "string",
                "minLength": 1,
                "pattern": "\\S"
            },
            "playlist_description": {
                "type": "string"
            },
            "tracks": {
                "type": "array",
                "minItems": 1,
                "maxItems": max_tracks,
                "items": {
                    "type": "object",
                    "properties": {
                        "track_name": { "type": "string", "minLength": 1, "pattern": "\\S" },
                        "artist_name": { "type": "string", "minLength": 1, "pattern": "\\S" }
                    },
                    "required": ["track_name", "artist_name"]
                }
            }
        },
        "required": ["playlist_title", "playlist_description", "tracks"]
    })
}
