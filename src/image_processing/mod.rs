pub mod focal;
pub mod report;
pub mod resize;
pub mod resolution;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::dataset::list_images;
use crate::utils::{display_name, verbose_println, warn_println};

pub use focal::{detect_focal_point, FocalPoint, HorizontalAnchor, VerticalAnchor};
pub use resolution::{select_best_resolution, AspectFamily, Resolution};

#[derive(Debug, Clone)]
pub struct CropConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub verbose: bool,
}

/// Outcome for one source image of the crop pipeline
#[derive(Debug, Clone)]
pub struct CropResult {
    pub input_path: PathBuf,
    pub source_size: (u32, u32),
    pub focal_point: FocalPoint,
    pub resolution: Resolution,
    pub output_path: PathBuf,
}

/// Per-bucket sequential file numbering. Counters live for one run only.
#[derive(Debug, Default)]
pub struct BucketCounters {
    counters: BTreeMap<Resolution, u32>,
}

impl BucketCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next index for the bucket and advance its counter
    pub fn next_index(&mut self, resolution: Resolution) -> u32 {
        let counter = self.counters.entry(resolution).or_insert(0);
        let index = *counter;
        *counter += 1;
        index
    }

    /// Images assigned so far, per bucket
    pub fn counts(&self) -> impl Iterator<Item = (&Resolution, &u32)> {
        self.counters.iter()
    }
}

/// Output location `{output_dir}/{width}x{height}/{index}.png`
pub fn bucket_output_path(output_dir: &Path, resolution: Resolution, index: u32) -> PathBuf {
    output_dir
        .join(resolution.to_string())
        .join(format!("{}.png", index))
}

pub struct CropEngine {
    config: CropConfig,
    counters: BucketCounters,
}

impl CropEngine {
    pub fn new(config: CropConfig) -> Self {
        Self {
            config,
            counters: BucketCounters::new(),
        }
    }

    /// Discover the raw images to process (flat listing, sorted by name)
    pub fn discover_images(&self) -> Result<Vec<PathBuf>> {
        verbose_println(
            self.config.verbose,
            &format!("Scanning directory: {}", self.config.input_dir.display()),
        );
        let images = list_images(&self.config.input_dir)?;
        verbose_println(
            self.config.verbose,
            &format!("Found {} image files", images.len()),
        );
        Ok(images)
    }

    /// Process every image in order, stopping at the first failure
    pub fn process_all(
        &mut self,
        image_files: &[PathBuf],
        progress: &ProgressBar,
    ) -> Result<Vec<CropResult>> {
        let mut results = Vec::with_capacity(image_files.len());

        for image_path in image_files {
            progress.set_message(display_name(image_path));
            let result = self.process_single_image(image_path)?;
            progress.println(format!(
                "{} -> {} [{}]",
                display_name(image_path),
                result.output_path.display(),
                result.focal_point
            ));
            results.push(result);
            progress.inc(1);
        }

        Ok(results)
    }

    /// Detect, select, crop, resize and write one image
    pub fn process_single_image(&mut self, input_path: &Path) -> Result<CropResult> {
        verbose_println(
            self.config.verbose,
            &format!("Processing: {}", input_path.display()),
        );

        let img = image::open(input_path)
            .with_context(|| format!("Failed to open image: {}", input_path.display()))?
            .to_rgb8();
        let (width, height) = img.dimensions();

        let focal_point = detect_focal_point(&img);
        let resolution = select_best_resolution(width, height);

        verbose_println(
            self.config.verbose,
            &format!(
                "{}x{} source, focal point {}, bucket {}",
                width, height, focal_point, resolution
            ),
        );

        let index = self.counters.next_index(resolution);
        let output_path = bucket_output_path(&self.config.output_dir, resolution, index);

        if !self.config.dry_run {
            let processed = resize::crop_and_resize(&img, focal_point, resolution)
                .with_context(|| format!("Failed to crop/resize: {}", input_path.display()))?;

            if let Some(bucket_dir) = output_path.parent() {
                std::fs::create_dir_all(bucket_dir).with_context(|| {
                    format!("Failed to create bucket directory: {}", bucket_dir.display())
                })?;
            }

            if output_path.exists() {
                warn_println(&format!(
                    "Overwriting existing output from an earlier run: {}",
                    output_path.display()
                ));
            }

            processed
                .save_with_format(&output_path, image::ImageFormat::Png)
                .with_context(|| format!("Failed to save PNG: {}", output_path.display()))?;
        }

        Ok(CropResult {
            input_path: input_path.to_path_buf(),
            source_size: (width, height),
            focal_point,
            resolution,
            output_path,
        })
    }

    pub fn counters(&self) -> &BucketCounters {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, RgbImage};

    fn write_test_image(path: &Path, width: u32, height: u32) {
        let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_bucket_counters_are_independent() {
        let square = Resolution::new(768, 768);
        let landscape = Resolution::new(1216, 832);
        let mut counters = BucketCounters::new();

        assert_eq!(counters.next_index(square), 0);
        assert_eq!(counters.next_index(landscape), 0);
        assert_eq!(counters.next_index(square), 1);
        assert_eq!(counters.next_index(square), 2);
        assert_eq!(counters.next_index(landscape), 1);

        let counts: Vec<_> = counters.counts().map(|(r, c)| (*r, *c)).collect();
        assert_eq!(counts, vec![(square, 3), (landscape, 2)]);
    }

    #[test]
    fn test_bucket_output_path() {
        let path = bucket_output_path(Path::new("out"), Resolution::new(608, 416), 7);
        assert_eq!(path, PathBuf::from("out/608x416/7.png"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let input = temp.path().join("raw");
        let output = temp.path().join("img");
        std::fs::create_dir_all(&input).unwrap();
        write_test_image(&input.join("a.png"), 600, 400);

        let mut engine = CropEngine::new(CropConfig {
            input_dir: input.clone(),
            output_dir: output.clone(),
            dry_run: true,
            verbose: false,
        });

        let images = engine.discover_images().unwrap();
        let result = engine.process_single_image(&images[0]).unwrap();

        assert_eq!(result.resolution, Resolution::new(608, 416));
        assert_eq!(result.output_path, output.join("608x416").join("0.png"));
        assert!(!output.exists());
    }

    #[test]
    fn test_unreadable_image_reports_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bogus = temp.path().join("broken.jpg");
        std::fs::write(&bogus, b"not an image").unwrap();

        let mut engine = CropEngine::new(CropConfig {
            input_dir: temp.path().to_path_buf(),
            output_dir: temp.path().join("out"),
            dry_run: false,
            verbose: false,
        });

        let err = engine.process_single_image(&bogus).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.jpg"));
    }
}
