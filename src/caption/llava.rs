use anyhow::{Context, Result};
use image::DynamicImage;

use super::preprocess::{preprocess, PixelValues};
use super::prompt::{
    clean_caption, expand_image_tokens, render_llama3_chat, strip_prompt, Conversation,
    DEFAULT_IMAGE_PLACEHOLDER,
};
use super::{CaptionGenerator, GenerationParams};

/// Tokenizer and conditional-generation surface of a LLaVA-style model.
///
/// Implementations wrap an actual inference runtime; the captioning pipeline
/// only needs these operations.
pub trait VisionLanguageModel {
    /// Encode rendered prompt text without adding special tokens
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    /// Decode token ids, optionally skipping special tokens
    fn decode(&self, tokens: &[u32], skip_special_tokens: bool) -> Result<String>;

    /// Token id the image placeholder text encodes to
    fn image_token_id(&self) -> u32;

    /// Number of visual tokens the vision tower produces per image
    fn image_seq_length(&self) -> usize;

    /// Render a conversation with the model's chat template
    fn apply_chat_template(&self, conversation: &Conversation) -> String {
        render_llama3_chat(conversation, DEFAULT_IMAGE_PLACEHOLDER, true)
    }

    /// Run inference-only generation and return the full sequence (prompt included)
    fn generate(
        &mut self,
        input_ids: &[u32],
        attention_mask: &[u32],
        pixel_values: &PixelValues,
        params: &GenerationParams,
    ) -> Result<Vec<u32>>;
}

/// Captioner driving a local vision-language model through the full prompt pipeline
pub struct LlavaCaptioner<M: VisionLanguageModel> {
    model: M,
    conversation: Conversation,
    params: GenerationParams,
}

impl<M: VisionLanguageModel> LlavaCaptioner<M> {
    pub fn new(model: M, params: GenerationParams) -> Self {
        Self {
            model,
            conversation: Conversation::captioning(),
            params,
        }
    }

    /// Token ids for the conversation with the image placeholder expanded
    pub fn build_input_ids(&self) -> Result<Vec<u32>> {
        let prompt = self.model.apply_chat_template(&self.conversation);
        let tokens = self
            .model
            .encode(&prompt)
            .context("Failed to tokenize caption prompt")?;

        Ok(expand_image_tokens(
            &tokens,
            self.model.image_token_id(),
            self.model.image_seq_length(),
        ))
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: VisionLanguageModel> CaptionGenerator for LlavaCaptioner<M> {
    fn generate_caption(&mut self, image: &DynamicImage) -> Result<String> {
        let pixel_values = preprocess(image)?;
        let input_ids = self.build_input_ids()?;
        let attention_mask = vec![1u32; input_ids.len()];

        let generated = self
            .model
            .generate(&input_ids, &attention_mask, &pixel_values, &self.params)
            .context("Model generation failed")?;

        let new_tokens = strip_prompt(&generated, input_ids.len());
        let text = self
            .model
            .decode(new_tokens, true)
            .context("Failed to decode generated tokens")?;

        Ok(clean_caption(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::collections::HashMap;

    const IMAGE_TOKEN: u32 = 7;
    const EOT_TOKEN: u32 = 9;

    /// Whitespace tokenizer with a fixed vocabulary and a scripted reply
    struct ScriptedModel {
        vocab: HashMap<String, u32>,
        reply: Vec<u32>,
        seen_input_len: Option<usize>,
        seen_shape: Option<[usize; 4]>,
        seen_params: Option<GenerationParams>,
    }

    impl ScriptedModel {
        fn new(reply: Vec<u32>) -> Self {
            let vocab = [("<image>", IMAGE_TOKEN), ("<|eot_id|>", EOT_TOKEN), ("a", 20), ("cat", 21)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
            Self {
                vocab,
                reply,
                seen_input_len: None,
                seen_shape: None,
                seen_params: None,
            }
        }
    }

    impl VisionLanguageModel for ScriptedModel {
        fn encode(&self, text: &str) -> Result<Vec<u32>> {
            Ok(text
                .split_whitespace()
                .map(|word| *self.vocab.get(word).unwrap_or(&1))
                .collect())
        }

        fn decode(&self, tokens: &[u32], skip_special_tokens: bool) -> Result<String> {
            let words: Vec<String> = tokens
                .iter()
                .filter(|&&t| !(skip_special_tokens && t == EOT_TOKEN))
                .map(|t| {
                    self.vocab
                        .iter()
                        .find(|(_, id)| *id == t)
                        .map(|(w, _)| w.clone())
                        .unwrap_or_default()
                })
                .collect();
            Ok(format!("  {}  ", words.join(" ")))
        }

        fn image_token_id(&self) -> u32 {
            IMAGE_TOKEN
        }

        fn image_seq_length(&self) -> usize {
            5
        }

        fn apply_chat_template(&self, _conversation: &Conversation) -> String {
            "sys <image> describe".to_string()
        }

        fn generate(
            &mut self,
            input_ids: &[u32],
            attention_mask: &[u32],
            pixel_values: &PixelValues,
            params: &GenerationParams,
        ) -> Result<Vec<u32>> {
            assert_eq!(input_ids.len(), attention_mask.len());
            self.seen_input_len = Some(input_ids.len());
            self.seen_shape = Some(pixel_values.shape);
            self.seen_params = Some(params.clone());

            let mut out = input_ids.to_vec();
            out.extend_from_slice(&self.reply);
            Ok(out)
        }
    }

    fn test_image() -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(50, 40, Rgb([200, 100, 50])))
    }

    #[test]
    fn test_input_ids_expand_image_placeholder() {
        let captioner = LlavaCaptioner::new(ScriptedModel::new(vec![]), GenerationParams::default());
        let ids = captioner.build_input_ids().unwrap();

        assert_eq!(ids.len(), 2 + 5);
        assert_eq!(ids.iter().filter(|&&t| t == IMAGE_TOKEN).count(), 5);
    }

    #[test]
    fn test_caption_strips_prompt_and_special_tokens() {
        let model = ScriptedModel::new(vec![20, 21, EOT_TOKEN]);
        let mut captioner = LlavaCaptioner::new(model, GenerationParams::default());

        let caption = captioner.generate_caption(&test_image()).unwrap();
        assert_eq!(caption, "a cat");

        let model = captioner.model();
        assert_eq!(model.seen_input_len, Some(7));
        assert_eq!(model.seen_shape, Some([1, 3, 384, 384]));
        let params = model.seen_params.clone().unwrap();
        assert_eq!(params.max_new_tokens, 512);
        assert!(params.do_sample);
        assert!(params.use_cache);
    }
}
