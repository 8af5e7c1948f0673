//! Caption review session: the navigation and save logic behind the review GUI,
//! kept free of any windowing code so it can be driven from tests.

use anyhow::{Context, Result};
use image::{imageops::FilterType, RgbaImage};
use std::path::{Path, PathBuf};

use crate::dataset::{find_caption_pairs, CaptionPair};

/// Longest edge allowed for the displayed image
pub const THUMBNAIL_MAX: u32 = 1024;

pub const NO_PAIRS_MESSAGE: &str = "No images with captions found in the selected directory.";
pub const EMPTY_CAPTION_MESSAGE: &str = "Caption cannot be empty.";
pub const SAVED_MESSAGE: &str = "Caption saved successfully.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Empty,
    Viewing(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    NoPairs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// Caption was empty after trimming; nothing written
    RejectedEmpty,
    NoSelection,
}

#[derive(Debug)]
pub struct ReviewSession {
    root: Option<PathBuf>,
    pairs: Vec<CaptionPair>,
    state: ReviewState,
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewSession {
    pub fn new() -> Self {
        Self {
            root: None,
            pairs: Vec::new(),
            state: ReviewState::Empty,
        }
    }

    pub fn from_pairs(pairs: Vec<CaptionPair>) -> Self {
        let state = if pairs.is_empty() {
            ReviewState::Empty
        } else {
            ReviewState::Viewing(0)
        };
        Self {
            root: None,
            pairs,
            state,
        }
    }

    /// Replace the session with the caption pairs found under `dir`.
    ///
    /// On error the previous session is left untouched.
    pub fn load(&mut self, dir: &Path) -> Result<LoadOutcome> {
        let pairs = find_caption_pairs(dir)
            .with_context(|| format!("Failed to scan directory: {}", dir.display()))?;

        *self = Self::from_pairs(pairs);
        self.root = Some(dir.to_path_buf());

        Ok(match self.state {
            ReviewState::Empty => LoadOutcome::NoPairs,
            ReviewState::Viewing(_) => LoadOutcome::Loaded(self.pairs.len()),
        })
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn pairs(&self) -> &[CaptionPair] {
        &self.pairs
    }

    pub fn current(&self) -> Option<&CaptionPair> {
        match self.state {
            ReviewState::Empty => None,
            ReviewState::Viewing(index) => self.pairs.get(index),
        }
    }

    /// Move forward one pair; returns false at the last pair
    pub fn next(&mut self) -> bool {
        match self.state {
            ReviewState::Viewing(index) if index + 1 < self.pairs.len() => {
                self.state = ReviewState::Viewing(index + 1);
                true
            }
            _ => false,
        }
    }

    /// Move back one pair; returns false at the first pair
    pub fn previous(&mut self) -> bool {
        match self.state {
            ReviewState::Viewing(index) if index > 0 => {
                self.state = ReviewState::Viewing(index - 1);
                true
            }
            _ => false,
        }
    }

    /// "3 / 10" style position of the cursor
    pub fn position_label(&self) -> Option<String> {
        match self.state {
            ReviewState::Empty => None,
            ReviewState::Viewing(index) => Some(format!("{} / {}", index + 1, self.pairs.len())),
        }
    }

    /// Caption file contents of the current pair, verbatim
    pub fn read_caption(&self) -> Result<Option<String>> {
        let Some(pair) = self.current() else {
            return Ok(None);
        };

        let text = std::fs::read_to_string(&pair.caption_path).with_context(|| {
            format!("Failed to read caption: {}", pair.caption_path.display())
        })?;
        Ok(Some(text))
    }

    /// Write `text`, trimmed, to the current caption file
    pub fn save_caption(&self, text: &str) -> Result<SaveOutcome> {
        let Some(pair) = self.current() else {
            return Ok(SaveOutcome::NoSelection);
        };

        let caption = text.trim();
        if caption.is_empty() {
            return Ok(SaveOutcome::RejectedEmpty);
        }

        std::fs::write(&pair.caption_path, caption).with_context(|| {
            format!("Failed to write caption: {}", pair.caption_path.display())
        })?;
        Ok(SaveOutcome::Saved(pair.caption_path.clone()))
    }
}

/// Dimensions of `width`x`height` scaled down to fit the box, keeping aspect ratio.
/// Images already inside the box are returned unchanged.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let fitted_w = ((width as f64 * scale).round() as u32).clamp(1, max_width);
    let fitted_h = ((height as f64 * scale).round() as u32).clamp(1, max_height);
    (fitted_w, fitted_h)
}

/// Decode an image for display, shrunk to fit the thumbnail box
pub fn load_thumbnail(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?;

    let (width, height) = fit_within(img.width(), img.height(), THUMBNAIL_MAX, THUMBNAIL_MAX);
    if (width, height) == (img.width(), img.height()) {
        return Ok(img.to_rgba8());
    }

    Ok(img.resize_exact(width, height, FilterType::Lanczos3).to_rgba8())
}
