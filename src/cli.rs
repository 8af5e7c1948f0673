use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CAPTION_INPUT: &str = "../img";
pub const DEFAULT_CAPTION_OUTPUT: &str = "../dataset";
pub const DEFAULT_CROP_INPUT: &str = "../raw";
pub const DEFAULT_CROP_OUTPUT: &str = "../img";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Parser, Debug)]
#[command(
    name = "captionkit",
    version,
    about = "Dataset preparation for image-caption training sets",
    long_about = "
captionkit - image dataset preparation

Two batch tools for building image/caption training sets:

• caption: walk an image tree, generate a long description for every image with a
  vision-language model and write image + caption pairs into a mirrored tree
• crop: sort raw photos into fixed resolution buckets, cropping toward the
  detected focal point and resizing to the exact bucket size

Captions can be reviewed and edited afterwards with captionkit-review.

Example Usage:
  # Caption ../img into ../dataset using a local model server
  captionkit caption

  # Caption a specific tree, keep going past broken images
  captionkit caption -i ~/photos/curated -o ~/datasets/v2 --continue-on-error

  # Point at another OpenAI-compatible server and model
  captionkit caption --endpoint http://gpu-box:8000/v1 --model my-captioner

  # Bucket raw photos into ../img/{width}x{height}/
  captionkit crop

  # Preview bucket assignments without writing anything
  captionkit crop -i ~/photos/raw --dry-run --report --verbose

  # Take settings from a config file (command-line flags still win)
  captionkit --config dataset.json crop"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// JSON configuration file; command-line values take precedence
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a caption file for every image under the input tree
    Caption(CaptionArgs),
    /// Crop and resize raw images into resolution buckets
    Crop(CropArgs),
}

#[derive(clap::Args, Debug, Default, Clone)]
pub struct CaptionArgs {
    /// Input root directory [default: ../img]
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Output root directory [default: ../dataset]
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// OpenAI-compatible API base URL [default: http://localhost:8000/v1]
    #[arg(long = "endpoint", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Model name served by the endpoint
    #[arg(long = "model", value_name = "NAME")]
    pub model: Option<String>,

    /// Bearer token for the model server
    #[arg(long = "api-key", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Maximum number of generated tokens per caption [default: 512]
    #[arg(long = "max-new-tokens", value_name = "N")]
    pub max_new_tokens: Option<usize>,

    /// Sampling temperature, 0 for greedy decoding [default: 0.6]
    #[arg(long = "temperature", value_name = "T")]
    pub temperature: Option<f32>,

    /// Nucleus sampling probability mass [default: 0.9]
    #[arg(long = "top-p", value_name = "P")]
    pub top_p: Option<f32>,

    /// Request timeout in seconds [default: 300]
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Log failed images and keep going instead of aborting the run
    #[arg(long = "continue-on-error")]
    pub continue_on_error: bool,
}

#[derive(clap::Args, Debug, Default, Clone)]
pub struct CropArgs {
    /// Directory of raw images (not searched recursively) [default: ../raw]
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Output root for resolution buckets [default: ../img]
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Detect and select buckets without writing any files
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Print a table of bucket assignments after the run
    #[arg(long = "report")]
    pub report: bool,
}
