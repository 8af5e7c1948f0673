use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

use super::CaptionGenerator;
use crate::dataset::{caption_path_for, is_supported_image};
use crate::utils::{display_name, error_println, verbose_println, warn_println, ProcessingStats};

#[derive(Debug, Clone)]
pub struct CaptionBatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Log a failed image and move on instead of aborting the run
    pub continue_on_error: bool,
    pub verbose: bool,
}

/// Files written for one captioned image
#[derive(Debug, Clone)]
pub struct CaptionedImage {
    pub input_path: PathBuf,
    pub image_path: PathBuf,
    pub caption_path: PathBuf,
}

#[derive(Debug)]
pub struct CaptionFailure {
    pub input_path: PathBuf,
    pub error: anyhow::Error,
}

/// Images found by the walk, plus entries that could not be read
#[derive(Debug, Default)]
pub struct BatchPlan {
    pub images: Vec<PathBuf>,
    pub unreadable: Vec<CaptionFailure>,
}

#[derive(Debug)]
pub struct CaptionRunSummary {
    pub processed: Vec<CaptionedImage>,
    pub failed: Vec<CaptionFailure>,
    /// Caption files written more than once (images sharing a stem)
    pub replaced_captions: Vec<PathBuf>,
    pub stats: ProcessingStats,
}

pub struct CaptionBatch {
    config: CaptionBatchConfig,
}

impl CaptionBatch {
    pub fn new(config: CaptionBatchConfig) -> Self {
        Self { config }
    }

    /// Output directory mirroring `dir` (which must live under the input root)
    pub fn mirrored_dir(&self, dir: &Path) -> Result<PathBuf> {
        let relative = dir.strip_prefix(&self.config.input_dir).with_context(|| {
            format!(
                "{} is not inside input directory {}",
                dir.display(),
                self.config.input_dir.display()
            )
        })?;
        Ok(self.config.output_dir.join(relative))
    }

    /// Walk the input tree, recreate every directory under the output root and
    /// collect the images to caption in sorted traversal order.
    ///
    /// Symlinked image files are included. With `continue_on_error` an unreadable
    /// entry is logged and recorded in the plan instead of ending the walk.
    pub fn prepare(&self) -> Result<BatchPlan> {
        let mut plan = BatchPlan::default();

        for entry in WalkDir::new(&self.config.input_dir)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if self.config.continue_on_error => {
                    let input_path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.config.input_dir.clone());
                    let error = anyhow::Error::new(err)
                        .context(format!("Skipping unreadable entry: {}", input_path.display()));
                    error_println(&format!("{:#}", error));
                    plan.unreadable.push(CaptionFailure { input_path, error });
                    continue;
                }
                Err(err) => return Err(err).context("Failed to read directory entry"),
            };
            let path = entry.path();

            if entry.file_type().is_dir() {
                let target = self.mirrored_dir(path)?;
                std::fs::create_dir_all(&target)
                    .with_context(|| format!("Failed to create directory: {}", target.display()))?;
            } else if path.is_file() && is_supported_image(path) {
                plan.images.push(path.to_path_buf());
            }
        }

        verbose_println(
            self.config.verbose,
            &format!("Found {} image files", plan.images.len()),
        );
        Ok(plan)
    }

    /// Caption every image, copying it next to its caption in the output tree
    pub fn run(
        &self,
        generator: &mut dyn CaptionGenerator,
        images: &[PathBuf],
        progress: &ProgressBar,
    ) -> Result<CaptionRunSummary> {
        let started = Instant::now();
        let mut stats = ProcessingStats::new(images.len());
        let mut processed = Vec::new();
        let mut failed = Vec::new();
        let mut written_captions = HashSet::new();
        let mut replaced_captions = Vec::new();

        for image_path in images {
            progress.set_message(display_name(image_path));

            match self.process_image(generator, image_path) {
                Ok(captioned) => {
                    if !written_captions.insert(captioned.caption_path.clone()) {
                        progress.suspend(|| {
                            warn_println(&format!(
                                "Caption {} was already written this run; replaced by the caption for {}",
                                captioned.caption_path.display(),
                                display_name(image_path)
                            ))
                        });
                        replaced_captions.push(captioned.caption_path.clone());
                    }
                    progress.println(format!(
                        "Processed {}, caption saved as {}",
                        display_name(image_path),
                        captioned.caption_path.display()
                    ));
                    stats.successful += 1;
                    processed.push(captioned);
                }
                Err(error) if self.config.continue_on_error => {
                    progress.suspend(|| error_println(&format!("{:#}", error)));
                    stats.failed += 1;
                    failed.push(CaptionFailure {
                        input_path: image_path.clone(),
                        error,
                    });
                }
                Err(error) => return Err(error),
            }

            progress.inc(1);
        }

        stats.total_duration = started.elapsed();
        Ok(CaptionRunSummary {
            processed,
            failed,
            replaced_captions,
            stats,
        })
    }

    /// Caption one image, then copy it and write its caption file
    pub fn process_image(
        &self,
        generator: &mut dyn CaptionGenerator,
        input_path: &Path,
    ) -> Result<CaptionedImage> {
        verbose_println(
            self.config.verbose,
            &format!("Processing: {}", input_path.display()),
        );

        let image = image::open(input_path)
            .with_context(|| format!("Failed to open image: {}", input_path.display()))?;

        let caption = generator
            .generate_caption(&image)
            .with_context(|| format!("Failed to caption image: {}", input_path.display()))?;

        let parent = input_path.parent().unwrap_or(&self.config.input_dir);
        let target_dir = self.mirrored_dir(parent)?;
        let file_name = input_path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Image path has no file name: {}", input_path.display()))?;

        let image_path = target_dir.join(file_name);
        std::fs::copy(input_path, &image_path)
            .with_context(|| format!("Failed to copy image to {}", image_path.display()))?;

        let caption_path = caption_path_for(&image_path);
        std::fs::write(&caption_path, &caption)
            .with_context(|| format!("Failed to write caption: {}", caption_path.display()))?;

        Ok(CaptionedImage {
            input_path: input_path.to_path_buf(),
            image_path,
            caption_path,
        })
    }
}
