use anyhow::Result;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

/// Side length of the square model input
pub const INPUT_SIZE: u32 = 384;

/// Per-channel normalization applied after scaling to [0, 1]
const NORMALIZE_MEAN: f32 = 0.5;
const NORMALIZE_STD: f32 = 0.5;

/// Normalized pixel tensor in `[batch, channels, height, width]` layout
#[derive(Debug, Clone, PartialEq)]
pub struct PixelValues {
    pub shape: [usize; 4],
    pub data: Vec<f32>,
}

impl PixelValues {
    /// Value at (channel, y, x) of the single batch item
    pub fn at(&self, channel: usize, y: usize, x: usize) -> f32 {
        let [_, _, height, width] = self.shape;
        self.data[channel * height * width + y * width + x]
    }
}

/// Resize to the square model input if needed, then drop alpha
pub fn prepare_input_image(image: &DynamicImage) -> RgbImage {
    let resized = if image.width() != INPUT_SIZE || image.height() != INPUT_SIZE {
        image.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Lanczos3)
    } else {
        image.clone()
    };
    resized.to_rgb8()
}

/// Convert an RGB image into a normalized, channel-major single-item batch
pub fn to_pixel_values(rgb: &RgbImage) -> PixelValues {
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let plane = width * height;
    let mut data = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let offset = y as usize * width + x as usize;
        for channel in 0..3 {
            let scaled = pixel[channel] as f32 / 255.0;
            data[channel * plane + offset] = (scaled - NORMALIZE_MEAN) / NORMALIZE_STD;
        }
    }

    PixelValues {
        shape: [1, 3, height, width],
        data,
    }
}

/// Full preprocessing: resize, RGB, normalize, batch
pub fn preprocess(image: &DynamicImage) -> Result<PixelValues> {
    let rgb = prepare_input_image(image);
    Ok(to_pixel_values(&rgb))
}
