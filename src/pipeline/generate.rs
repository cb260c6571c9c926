use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::debug;

use super::prompt::PromptTemplate;
use crate::clients::{ClientError, TextGenerator, within};

const SERVICE: &str = "gemini";

/// Stage that turns mood text into the generator's raw answer.
#[async_trait]
pub trait GenerateStage: Send + Sync {
    /// One generation attempt; retries are decided by the caller.
    async fn generate(&self, mood_text: &str) -> Result<String, ClientError>;
}

/// Prompts the text generator with the fixed instruction template.
pub struct ConceptGenerator {
    generator: Arc<dyn TextGenerator>,
    template: PromptTemplate,
    call_timeout: Duration,
}

impl ConceptGenerator {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, max_tracks: usize, call_timeout: Duration) -> Self {
        Self {
            generator,
            template: PromptTemplate::new(max_tracks),
            call_timeout,
        }
    }
}

#[async_trait]
impl GenerateStage for ConceptGenerator {
    async fn generate(&self, mood_text: &str) -> Result<String, ClientError> {
        let prompt = self.template.render(mood_text);
        let raw = within(
            SERVICE,
            self.call_timeout,
            self.generator.generate_text(&prompt),
        )
        .await?;
        debug!(raw_chars = raw.len(), "concept generated");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CapturingGenerator {
        prompts: Mutex<Vec<String>>,
        delay: Duration,
    }

    #[async_trait]
    impl TextGenerator for CapturingGenerator {
        async fn generate_text(&self, prompt: &str) -> Result<String, ClientError> {
            tokio::time::sleep(self.delay).await;
            self.prompts
                .lock()
                .expect("prompt lock")
                .push(prompt.to_string());
            Ok("  {\"raw\": true}\n".to_string())
        }
    }

    #[tokio::test]
    async fn raw_text_is_returned_untouched() {
        let generator = Arc::new(CapturingGenerator {
            prompts: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        });
        let stage = ConceptGenerator::new(generator.clone(), 15, Duration::from_secs(1));

        let raw = stage.generate("late night drive").await.expect("generates");

        assert_eq!(raw, "  {\"raw\": true}\n");
        let prompts = generator.prompts.lock().expect("prompt lock");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with("User Input: \"late night drive\""));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generator_times_out() {
        let generator = Arc::new(CapturingGenerator {
            prompts: Mutex::new(Vec::new()),
            delay: Duration::from_secs(120),
        });
        let stage = ConceptGenerator::new(generator, 15, Duration::from_secs(60));

        let error = stage.generate("x").await.expect_err("times out");
        assert!(matches!(error, ClientError::Timeout { .. }));
    }
}
