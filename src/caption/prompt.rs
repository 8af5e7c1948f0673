//! Conversation construction and the token-level plumbing around it:
//! chat-template rendering, image placeholder expansion and caption clean-up.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const SYSTEM_PROMPT: &str = "You are a helpful image captioner.";
pub const USER_PROMPT: &str = "Write a long description of the image.";

/// Text placeholder the template inserts for the image; tokenizes to the image token
pub const DEFAULT_IMAGE_PLACEHOLDER: &str = "<image>";

static SPECIAL_TOKEN_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"<\|[A-Za-z0-9_]+\|>").expect("special token pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, role: Role, content: impl Into<String>) -> Self {
        self.messages.push(Message {
            role,
            content: content.into(),
        });
        self
    }

    /// The fixed captioning conversation: captioner persona + long-description request
    pub fn captioning() -> Self {
        Self::new()
            .with_message(Role::System, SYSTEM_PROMPT)
            .with_message(Role::User, USER_PROMPT)
    }
}

/// Render a conversation with the Llama 3 chat template.
///
/// Message contents are trimmed, the image placeholder is prepended to the first
/// user turn, and with `add_generation_prompt` an open assistant header is
/// appended so the model continues as the assistant.
pub fn render_llama3_chat(
    conversation: &Conversation,
    image_placeholder: &str,
    add_generation_prompt: bool,
) -> String {
    let mut rendered = String::from("<|begin_of_text|>");
    let mut image_inserted = false;

    for message in &conversation.messages {
        rendered.push_str("<|start_header_id|>");
        rendered.push_str(message.role.as_str());
        rendered.push_str("<|end_header_id|>\n\n");

        if message.role == Role::User && !image_inserted {
            rendered.push_str(image_placeholder);
            image_inserted = true;
        }

        rendered.push_str(message.content.trim());
        rendered.push_str("<|eot_id|>");
    }

    if add_generation_prompt {
        rendered.push_str("<|start_header_id|>assistant<|end_header_id|>\n\n");
    }

    rendered
}

/// Replace every image token with `image_seq_length` copies of itself
pub fn expand_image_tokens(tokens: &[u32], image_token_id: u32, image_seq_length: usize) -> Vec<u32> {
    let image_count = tokens.iter().filter(|&&t| t == image_token_id).count();
    let mut expanded =
        Vec::with_capacity(tokens.len() + image_count * image_seq_length.saturating_sub(1));

    for &token in tokens {
        if token == image_token_id {
            expanded.extend(std::iter::repeat(image_token_id).take(image_seq_length));
        } else {
            expanded.push(token);
        }
    }

    expanded
}

/// Drop the prompt prefix from a generated sequence
pub fn strip_prompt(generated: &[u32], prompt_len: usize) -> &[u32] {
    generated.get(prompt_len..).unwrap_or(&[])
}

/// Remove leftover `<|...|>` control markers and surrounding whitespace
pub fn clean_caption(raw: &str) -> String {
    SPECIAL_TOKEN_RE.replace_all(raw, "").trim().to_string()
}
