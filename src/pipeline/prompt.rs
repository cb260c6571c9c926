//! Instruction template sent ahead of the caller's mood text.

/// Renders the generation prompt for a given track ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PromptTemplate {
    instructions: String,
}

impl PromptTemplate {
    pub(crate) fn new(max_tracks: usize) -> Self {
        let max_tracks = max_tracks.max(1);
        let min_tracks = (max_tracks * 2 / 3).max(1);
        let track_target = if min_tracks == max_tracks {
            format!("{max_tracks}")
        } else {
            format!("{min_tracks}-{max_tracks}")
        };

        let instructions = format!(
            "You are an expert music curator who builds Spotify playlists from a listener's \
mood, story or activity.

Work through these steps:

1.  Read the listener's input and identify the mood (for example \"melancholic\"), the \
scene they describe (for example \"a rainy Sunday afternoon\") or what they are doing \
(for example \"a coding session\").
2.  Invent a playlist title and a one or two sentence description that capture that input.
3.  Pick {track_target} real songs available on Spotify that fit the mood and theme. \
Never list more than {max_tracks} songs.
4.  Reply with exactly one JSON object following the schema below. Do not add greetings, \
explanations or markdown code fences; the reply is parsed by a program.

JSON Schema:
{{
  \"playlist_title\": \"string\",
  \"playlist_description\": \"string\",
  \"tracks\": [
    {{
      \"track_name\": \"string\",
      \"artist_name\": \"string\"
    }}
  ]
}}"
        );

        Self { instructions }
    }

    pub(crate) fn render(&self, mood_text: &str) -> String {
        format!("{}\n\nUser Input: \"{mood_text}\"", self.instructions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_appends_quoted_mood() {
        let prompt = PromptTemplate::new(15).render("rainy Sunday, lots of tea");
        assert!(prompt.ends_with("\n\nUser Input: \"rainy Sunday, lots of tea\""));
        assert!(prompt.contains("\"playlist_title\": \"string\""));
    }

    #[test]
    fn track_target_follows_ceiling() {
        assert!(PromptTemplate::new(15).render("x").contains("Pick 10-15 real songs"));
        assert!(PromptTemplate::new(1).render("x").contains("Pick 1 real songs"));
        assert!(PromptTemplate::new(30).render("x").contains("more than 30 songs"));
    }
}
