pub mod batch;
pub mod llava;
pub mod preprocess;
pub mod prompt;
pub mod remote;

use anyhow::Result;
use image::DynamicImage;

pub use batch::{BatchPlan, CaptionBatch, CaptionBatchConfig, CaptionRunSummary};
pub use llava::{LlavaCaptioner, VisionLanguageModel};
pub use remote::{RemoteCaptioner, RemoteConfig};

/// Default captioning model
pub const DEFAULT_MODEL_NAME: &str = "fancyfeast/llama-joycaption-alpha-two-hf-llava";

/// Anything that turns an image into a caption
pub trait CaptionGenerator {
    fn generate_caption(&mut self, image: &DynamicImage) -> Result<String>;
}

/// Decoding settings passed to the model
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: usize,
    pub do_sample: bool,
    pub temperature: f32,
    pub top_p: f32,
    pub use_cache: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
            do_sample: true,
            temperature: 0.6,
            top_p: 0.9,
            use_cache: true,
        }
    }
}
