use anyhow::Result;
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{imageops, RgbImage};

use super::focal::{FocalPoint, HorizontalAnchor, VerticalAnchor};
use super::resolution::Resolution;

/// Region of the source image kept by the crop step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropWindow {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Compute the crop window that brings a `src_width` x `src_height` image to the
/// target's aspect ratio.
///
/// Only one axis is ever cropped; the other keeps its full extent. The window is
/// anchored by the focal point on the cropped axis: left/top start at 0,
/// right/bottom end at the far edge, center splits the excess evenly.
pub fn crop_window(
    src_width: u32,
    src_height: u32,
    focal: FocalPoint,
    target: Resolution,
) -> CropWindow {
    let target_aspect = target.aspect_ratio();
    let source_aspect = src_width as f64 / src_height as f64;

    if source_aspect > target_aspect {
        // Source is wider - crop width
        let new_width = ((src_height as f64 * target_aspect) as u32).clamp(1, src_width);
        let excess = src_width - new_width;
        let x = match focal.horizontal {
            HorizontalAnchor::Left => 0,
            HorizontalAnchor::Center => excess / 2,
            HorizontalAnchor::Right => excess,
        };
        CropWindow {
            x,
            y: 0,
            width: new_width,
            height: src_height,
        }
    } else if source_aspect < target_aspect {
        // Source is taller - crop height
        let new_height = ((src_width as f64 / target_aspect) as u32).clamp(1, src_height);
        let excess = src_height - new_height;
        let y = match focal.vertical {
            VerticalAnchor::Top => 0,
            VerticalAnchor::Center => excess / 2,
            VerticalAnchor::Bottom => excess,
        };
        CropWindow {
            x: 0,
            y,
            width: src_width,
            height: new_height,
        }
    } else {
        CropWindow::full(src_width, src_height)
    }
}

/// Crop an image to the target aspect ratio, biased toward the focal point
pub fn crop_to_aspect(img: &RgbImage, focal: FocalPoint, target: Resolution) -> Result<RgbImage> {
    let (width, height) = img.dimensions();
    let window = crop_window(width, height, focal, target);

    if window == CropWindow::full(width, height) {
        return Ok(img.clone());
    }

    crop_image(img, window)
}

/// Crop an image to the given window
fn crop_image(img: &RgbImage, window: CropWindow) -> Result<RgbImage> {
    let (img_width, img_height) = img.dimensions();

    if window.x + window.width > img_width || window.y + window.height > img_height {
        return Err(anyhow::anyhow!(
            "Crop dimensions exceed image bounds: crop({},{},{}x{}) on {}x{} image",
            window.x,
            window.y,
            window.width,
            window.height,
            img_width,
            img_height
        ));
    }

    Ok(imageops::crop_imm(img, window.x, window.y, window.width, window.height).to_image())
}

/// Resize an image to exact dimensions using Lanczos3 convolution
pub fn resize_exact(img: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    let (src_width, src_height) = img.dimensions();

    if src_width == width && src_height == height {
        return Ok(img.clone());
    }
    if src_width == 0 || src_height == 0 {
        return Err(anyhow::anyhow!("Source image has zero size"));
    }
    if width == 0 || height == 0 {
        return Err(anyhow::anyhow!("Target size must be non-zero"));
    }

    let src_image = Image::from_vec_u8(src_width, src_height, img.as_raw().clone(), PixelType::U8x3)?;
    let mut dst_image = Image::new(width, height, PixelType::U8x3);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();
    resizer.resize(&src_image, &mut dst_image, Some(&options))?;

    RgbImage::from_raw(width, height, dst_image.buffer().to_vec())
        .ok_or_else(|| anyhow::anyhow!("Resized buffer does not match {}x{}", width, height))
}

/// Crop toward the focal point, then scale to the exact bucket size
pub fn crop_and_resize(img: &RgbImage, focal: FocalPoint, target: Resolution) -> Result<RgbImage> {
    let cropped = crop_to_aspect(img, focal, target)?;
    resize_exact(&cropped, target.width, target.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    fn focal(h: HorizontalAnchor, v: VerticalAnchor) -> FocalPoint {
        FocalPoint {
            horizontal: h,
            vertical: v,
        }
    }

    const ALL_FOCALS: [(HorizontalAnchor, VerticalAnchor); 9] = [
        (HorizontalAnchor::Left, VerticalAnchor::Top),
        (HorizontalAnchor::Left, VerticalAnchor::Center),
        (HorizontalAnchor::Left, VerticalAnchor::Bottom),
        (HorizontalAnchor::Center, VerticalAnchor::Top),
        (HorizontalAnchor::Center, VerticalAnchor::Center),
        (HorizontalAnchor::Center, VerticalAnchor::Bottom),
        (HorizontalAnchor::Right, VerticalAnchor::Top),
        (HorizontalAnchor::Right, VerticalAnchor::Center),
        (HorizontalAnchor::Right, VerticalAnchor::Bottom),
    ];

    #[test]
    fn test_wide_source_crops_width_toward_focal_point() {
        let square = Resolution::new(768, 768);

        let left = crop_window(2000, 1000, focal(HorizontalAnchor::Left, VerticalAnchor::Center), square);
        assert_eq!(left, CropWindow { x: 0, y: 0, width: 1000, height: 1000 });

        let center = crop_window(2000, 1000, FocalPoint::CENTER, square);
        assert_eq!(center, CropWindow { x: 500, y: 0, width: 1000, height: 1000 });

        let right = crop_window(2000, 1000, focal(HorizontalAnchor::Right, VerticalAnchor::Top), square);
        assert_eq!(right, CropWindow { x: 1000, y: 0, width: 1000, height: 1000 });
    }

    #[test]
    fn test_tall_source_crops_height_toward_focal_point() {
        let square = Resolution::new(512, 512);

        let top = crop_window(600, 900, focal(HorizontalAnchor::Right, VerticalAnchor::Top), square);
        assert_eq!(top, CropWindow { x: 0, y: 0, width: 600, height: 600 });

        let center = crop_window(600, 900, FocalPoint::CENTER, square);
        assert_eq!(center, CropWindow { x: 0, y: 150, width: 600, height: 600 });

        let bottom = crop_window(600, 900, focal(HorizontalAnchor::Left, VerticalAnchor::Bottom), square);
        assert_eq!(bottom, CropWindow { x: 0, y: 300, width: 600, height: 600 });
    }

    #[test]
    fn test_matching_aspect_is_not_cropped() {
        let window = crop_window(1216, 832, FocalPoint::CENTER, Resolution::new(1216, 832));
        assert_eq!(window, CropWindow::full(1216, 832));
    }

    #[test]
    fn test_crop_aspect_matches_target_for_every_focal_point() {
        let targets = [
            Resolution::new(1024, 1024),
            Resolution::new(1216, 832),
            Resolution::new(416, 608),
        ];

        for target in targets {
            for (w, h) in [(1500, 1000), (1000, 1500), (1800, 700), (640, 1400)] {
                for (hz, vt) in ALL_FOCALS {
                    let window = crop_window(w, h, focal(hz, vt), target);
                    assert!(window.x + window.width <= w);
                    assert!(window.y + window.height <= h);

                    // one axis is intact, the other is within one pixel of the exact ratio
                    let expected_width = window.height as f64 * target.aspect_ratio();
                    let expected_height = window.width as f64 / target.aspect_ratio();
                    if window.height == h && window.width < w {
                        assert!((window.width as f64 - expected_width).abs() < 1.0);
                    } else if window.width == w && window.height < h {
                        assert!((window.height as f64 - expected_height).abs() < 1.0);
                    } else {
                        assert_eq!(window, CropWindow::full(w, h));
                    }
                }
            }
        }
    }

    #[test]
    fn test_crop_to_aspect_copies_the_window() {
        let img = create_test_image(300, 100);
        let cropped = crop_to_aspect(
            &img,
            focal(HorizontalAnchor::Right, VerticalAnchor::Center),
            Resolution::new(512, 512),
        )
        .unwrap();

        assert_eq!(cropped.dimensions(), (100, 100));
        assert_eq!(cropped.get_pixel(0, 0), img.get_pixel(200, 0));
        assert_eq!(cropped.get_pixel(99, 99), img.get_pixel(299, 99));
    }

    #[test]
    fn test_crop_bounds_validation() {
        let img = create_test_image(50, 50);
        let too_big = CropWindow { x: 10, y: 10, width: 50, height: 50 };
        assert!(crop_image(&img, too_big).is_err());

        let fits = CropWindow { x: 10, y: 10, width: 40, height: 40 };
        assert!(crop_image(&img, fits).is_ok());
    }

    #[test]
    fn test_resize_exact() {
        let img = create_test_image(100, 60);
        let resized = resize_exact(&img, 50, 30).unwrap();
        assert_eq!(resized.dimensions(), (50, 30));

        let same = resize_exact(&img, 100, 60).unwrap();
        assert_eq!(same, img);
    }

    #[test]
    fn test_crop_and_resize_hits_exact_bucket() {
        let img = create_test_image(1400, 1000);
        let target = Resolution::new(912, 624);
        for (hz, vt) in ALL_FOCALS {
            let out = crop_and_resize(&img, focal(hz, vt), target).unwrap();
            assert_eq!(out.dimensions(), (912, 624));
        }
    }
}
