//! Caption generation through an OpenAI-compatible chat completions server
//! (vLLM, llama.cpp server, TGI...) hosting the captioning model.

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, ImageFormat};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::Duration;

use super::preprocess::prepare_input_image;
use super::prompt::{clean_caption, Conversation, Role};
use super::{CaptionGenerator, GenerationParams};

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL including the API version, e.g. `http://localhost:8000/v1`
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: ChatContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Encode the model-sized RGB image as a PNG data URI
pub fn image_data_uri(image: &DynamicImage) -> Result<String> {
    let rgb = prepare_input_image(image);
    let mut png = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("Failed to encode image as PNG")?;

    Ok(format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(&png)
    ))
}

/// Build the chat request: the image travels with the first user turn
pub fn build_request(
    model: &str,
    conversation: &Conversation,
    image_uri: String,
    params: &GenerationParams,
) -> ChatRequest {
    let mut image_uri = Some(image_uri);

    let messages = conversation
        .messages
        .iter()
        .map(|message| {
            let text = message.content.trim().to_string();
            let content = match (message.role, image_uri.take()) {
                (Role::User, Some(url)) => ChatContent::Parts(vec![
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url },
                    },
                    ContentPart::Text { text },
                ]),
                (_, pending) => {
                    image_uri = pending;
                    ChatContent::Text(text)
                }
            };
            ChatMessage {
                role: message.role,
                content,
            }
        })
        .collect();

    ChatRequest {
        model: model.to_string(),
        messages,
        max_tokens: params.max_new_tokens,
        temperature: if params.do_sample { params.temperature } else { 0.0 },
        top_p: params.top_p,
        stream: false,
    }
}

/// Pull the caption text out of a completion response
pub fn extract_caption(response: ChatResponse) -> Result<String> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow::anyhow!("Model server returned no completion"))?;

    Ok(clean_caption(&content))
}

pub struct RemoteCaptioner {
    client: Client,
    config: RemoteConfig,
    conversation: Conversation,
    params: GenerationParams,
}

impl RemoteCaptioner {
    pub fn new(config: RemoteConfig, params: GenerationParams) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            config,
            conversation: Conversation::captioning(),
            params,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }
}

impl CaptionGenerator for RemoteCaptioner {
    fn generate_caption(&mut self, image: &DynamicImage) -> Result<String> {
        let request = build_request(
            &self.config.model,
            &self.conversation,
            image_data_uri(image)?,
            &self.params,
        );

        let url = self.completions_url();
        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .with_context(|| format!("Failed to reach model server at {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Model server returned {}: {}",
                status,
                body
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .context("Failed to parse model server response")?;
        extract_caption(parsed)
    }
}
