use image::{GrayImage, RgbImage};
use imageproc::edges::canny;
use strum_macros::Display;

/// Canny hysteresis thresholds used for focal point detection
const CANNY_LOW_THRESHOLD: f32 = 100.0;
const CANNY_HIGH_THRESHOLD: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum HorizontalAnchor {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum VerticalAnchor {
    Top,
    Center,
    Bottom,
}

/// Coarse 3x3 grid cell holding most of the image's edge content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocalPoint {
    pub horizontal: HorizontalAnchor,
    pub vertical: VerticalAnchor,
}

impl FocalPoint {
    pub const CENTER: FocalPoint = FocalPoint {
        horizontal: HorizontalAnchor::Center,
        vertical: VerticalAnchor::Center,
    };

    /// Classify a centroid into thirds of the image dimensions
    pub fn classify(cx: u32, cy: u32, width: u32, height: u32) -> FocalPoint {
        let horizontal = if cx < width / 3 {
            HorizontalAnchor::Left
        } else if cx > 2 * width / 3 {
            HorizontalAnchor::Right
        } else {
            HorizontalAnchor::Center
        };

        let vertical = if cy < height / 3 {
            VerticalAnchor::Top
        } else if cy > 2 * height / 3 {
            VerticalAnchor::Bottom
        } else {
            VerticalAnchor::Center
        };

        FocalPoint {
            horizontal,
            vertical,
        }
    }
}

impl std::fmt::Display for FocalPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.horizontal, self.vertical)
    }
}

/// Intensity-weighted centroid (m10/m00, m01/m00) of a grayscale image.
///
/// Returns `None` when the total mass is zero.
pub fn intensity_centroid(img: &GrayImage) -> Option<(u32, u32)> {
    let mut m00 = 0.0f64;
    let mut m10 = 0.0f64;
    let mut m01 = 0.0f64;

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = pixel[0] as f64;
        if value == 0.0 {
            continue;
        }
        m00 += value;
        m10 += x as f64 * value;
        m01 += y as f64 * value;
    }

    if m00 == 0.0 {
        return None;
    }

    Some(((m10 / m00) as u32, (m01 / m00) as u32))
}

/// Locate the focal point of an image from the centroid of its Canny edges.
///
/// Images without any detected edges are anchored at the center.
pub fn detect_focal_point(img: &RgbImage) -> FocalPoint {
    let (width, height) = img.dimensions();
    let gray = image::imageops::grayscale(img);
    let edges = canny(&gray, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);

    match intensity_centroid(&edges) {
        Some((cx, cy)) => FocalPoint::classify(cx, cy, width, height),
        None => FocalPoint::CENTER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb};

    /// Black canvas with a white square at the given offset
    fn image_with_square(width: u32, height: u32, x0: u32, y0: u32, size: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            if x >= x0 && x < x0 + size && y >= y0 && y < y0 + size {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn test_blank_image_defaults_to_center() {
        let img: RgbImage = ImageBuffer::from_pixel(120, 90, Rgb([40, 80, 120]));
        assert_eq!(detect_focal_point(&img), FocalPoint::CENTER);
    }

    #[test]
    fn test_content_in_top_left() {
        let img = image_with_square(150, 150, 10, 10, 30);
        let focal = detect_focal_point(&img);
        assert_eq!(focal.horizontal, HorizontalAnchor::Left);
        assert_eq!(focal.vertical, VerticalAnchor::Top);
    }

    #[test]
    fn test_content_in_bottom_right() {
        let img = image_with_square(150, 150, 110, 110, 30);
        let focal = detect_focal_point(&img);
        assert_eq!(focal.horizontal, HorizontalAnchor::Right);
        assert_eq!(focal.vertical, VerticalAnchor::Bottom);
    }

    #[test]
    fn test_classify_thresholds() {
        // width 90: left below 30, right above 60
        assert_eq!(FocalPoint::classify(29, 45, 90, 90).horizontal, HorizontalAnchor::Left);
        assert_eq!(FocalPoint::classify(30, 45, 90, 90).horizontal, HorizontalAnchor::Center);
        assert_eq!(FocalPoint::classify(60, 45, 90, 90).horizontal, HorizontalAnchor::Center);
        assert_eq!(FocalPoint::classify(61, 45, 90, 90).horizontal, HorizontalAnchor::Right);
        assert_eq!(FocalPoint::classify(45, 0, 90, 90).vertical, VerticalAnchor::Top);
        assert_eq!(FocalPoint::classify(45, 89, 90, 90).vertical, VerticalAnchor::Bottom);
    }

    #[test]
    fn test_intensity_centroid() {
        let mut img: GrayImage = ImageBuffer::new(10, 10);
        assert_eq!(intensity_centroid(&img), None);

        img.put_pixel(2, 4, Luma([255]));
        img.put_pixel(6, 8, Luma([255]));
        assert_eq!(intensity_centroid(&img), Some((4, 6)));
    }

    #[test]
    fn test_display() {
        let focal = FocalPoint {
            horizontal: HorizontalAnchor::Right,
            vertical: VerticalAnchor::Top,
        };
        assert_eq!(focal.to_string(), "right/top");
    }
}
