pub mod gemini;
pub mod reply;

use async_trait::async_trait;
use bytes::Bytes;

pub use gemini::GeminiClient;
pub use reply::parse_reply;

/// Binary image sent inline with a prompt.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Bytes,
}

/// One generation call: an instruction, optional extra context text and an
/// optional image. `expect_json` asks the model for a JSON mime type.
#[derive(Debug, Clone, Default)]
pub struct ModelRequest {
    pub prompt: String,
    pub context: Option<String>,
    pub image: Option<InlineImage>,
    pub expect_json: bool,
}

impl ModelRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn json(mut self) -> Self {
        self.expect_json = true;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("request to model failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// `body` is for logs only and stays out of the message.
    #[error("model returned status {status}")]
    Status { status: u16, body: String },
    #[error("model returned no candidates")]
    EmptyResponse,
    #[error("could not decode model response: {0}")]
    Decode(String),
}

/// External generative model. Returns the reply text verbatim.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: ModelRequest) -> Result<String, ModelError>;
}
