//! Dataset file conventions shared by the captioner, the crop pipeline and the
//! review GUI: which files count as images, and how an image is paired with its
//! caption file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::utils::has_valid_extension;

/// Image extensions accepted by every tool (matched case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Extension of the sibling caption file
pub const CAPTION_EXTENSION: &str = "txt";

/// One dataset sample: an image and its same-stem caption file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionPair {
    pub image_path: PathBuf,
    pub caption_path: PathBuf,
}

pub fn is_supported_image(path: &Path) -> bool {
    has_valid_extension(path, &IMAGE_EXTENSIONS)
}

/// Caption path for an image: same directory, same stem, `.txt`
pub fn caption_path_for(image_path: &Path) -> PathBuf {
    image_path.with_extension(CAPTION_EXTENSION)
}

/// All supported images directly inside `dir`, sorted by file name
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        if path.is_file() && is_supported_image(&path) {
            images.push(path);
        }
    }

    images.sort();
    Ok(images)
}

/// Recursively find every image that has a caption file next to it.
///
/// Traversal is sorted by file name so the pairing order is stable between runs.
pub fn find_caption_pairs(root: &Path) -> Result<Vec<CaptionPair>> {
    let mut pairs = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();

        // `is_file` on the path follows symlinks, so linked images count too
        if !path.is_file() || !is_supported_image(path) {
            continue;
        }

        let caption_path = caption_path_for(path);
        if caption_path.is_file() {
            pairs.push(CaptionPair {
                image_path: path.to_path_buf(),
                caption_path,
            });
        }
    }

    Ok(pairs)
}
