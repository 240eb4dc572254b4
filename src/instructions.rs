use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    encoder::{encode_all, UploadedImage},
    error::GuideError,
    export::{EXPORT_FILE_NAME, EXPORT_MIME_TYPE},
    gemini::TextGenerator,
    models::{ExportInfo, StepSummary, TestingGuide},
    prompt::build_prompt,
};

/// Encode the screenshots, build the prompt and make exactly one generation call.
/// With no screenshots the generator is never invoked.
pub async fn generate_testing_instructions(
    generator: &dyn TextGenerator,
    images: &[UploadedImage],
    context: Option<&str>,
) -> Result<TestingGuide, GuideError> {
    if images.is_empty() {
        return Err(GuideError::InputMissing);
    }

    let refs = encode_all(images);
    let prompt = build_prompt(context, &refs);
    info!("🎯 Built prompt from {} screenshot(s) ({} chars)", refs.len(), prompt.len());

    let instructions = generator.generate(&prompt).await?;

    Ok(TestingGuide {
        id: Uuid::new_v4(),
        instructions,
        context: context.map(str::to_string),
        steps: refs
            .iter()
            .map(|r| StepSummary { step: r.step, file_name: r.file_name.clone(), caption: r.caption() })
            .collect(),
        model: generator.model_id().to_string(),
        export: ExportInfo {
            file_name: EXPORT_FILE_NAME.to_string(),
            mime_type: EXPORT_MIME_TYPE.to_string(),
        },
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::gemini::{GenerationError, TextGenerator};

    /// Canned generator that records every prompt it receives.
    pub struct FakeGenerator {
        pub reply: Result<String, GenerationError>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        pub fn ok(text: &str) -> Self {
            Self { reply: Ok(text.to_string()), prompts: Mutex::new(Vec::new()) }
        }

        pub fn failing(err: GenerationError) -> Self {
            Self { reply: Err(err), prompts: Mutex::new(Vec::new()) }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }

        fn model_id(&self) -> &str {
            "fake-model"
        }
    }
}
