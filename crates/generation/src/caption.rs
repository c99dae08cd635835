use async_trait::async_trait;
use serde_json::{json, Value};

use crate::http::ChatClient;
use crate::{GenerationConfig, GenerationError};

const CAPTION_SYSTEM: &str = "You are a helpful assistant that describes images in concise Korean.";
const CAPTION_REQUEST: &str = "이 이미지를 간단하게 설명해줘.";

/// Turns a publicly resolvable image URL into a short caption.
#[async_trait]
pub trait Captioner: Send + Sync {
    async fn caption(&self, image_url: &str) -> Result<String, GenerationError>;
}

/// [`Captioner`] that asks a vision chat model, deterministic temperature.
#[derive(Debug, Clone)]
pub struct VisionCaptioner {
    client: ChatClient,
    model: String,
}

impl VisionCaptioner {
    pub fn new(cfg: &GenerationConfig) -> Result<Self, GenerationError> {
        cfg.validate()?;
        Ok(Self {
            client: ChatClient::new(cfg)?,
            model: cfg.caption_model.clone(),
        })
    }
}

pub(crate) fn caption_payload(model: &str, image_url: &str) -> Value {
    json!({
        "model": model,
        "temperature": 0,
        "messages": [
            { "role": "system", "content": CAPTION_SYSTEM },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": CAPTION_REQUEST },
                    { "type": "image_url", "image_url": { "url": image_url } }
                ]
            }
        ]
    })
}

#[async_trait]
impl Captioner for VisionCaptioner {
    async fn caption(&self, image_url: &str) -> Result<String, GenerationError> {
        let text = self
            .client
            .complete(&caption_payload(&self.model, image_url))
            .await?;
        Ok(text.trim().to_string())
    }
}
