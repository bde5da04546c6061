//! Rip request lifecycle: how many frames were asked for, how many are
//! done, and how output files are named across a multi-frame request.
//!
//! The filename stem (sanitized game title + capture-start timestamp) is
//! derived once when a request is accepted, so every frame of a multi-frame
//! run shares it and differs only in the `_f<index>` suffix.

use chrono::Local;

use crate::DEFAULT_STEM;

/// Tracks one capture request from acceptance to completion.
pub struct RipRequest {
    frames_requested: u32,
    frames_done: u32,
    next_frame_index: u32,
    filename_stem: String,
}

impl RipRequest {
    /// A fresh tracker starts out done, so the first request is accepted.
    pub fn new() -> Self {
        RipRequest {
            frames_requested: 0,
            frames_done: 0,
            next_frame_index: 0,
            filename_stem: String::new(),
        }
    }

    /// Accept a new request. Silently ignored while the previous request is
    /// still in progress.
    pub fn start(&mut self, frames_requested: u32, game_title: &str) {
        if !self.is_done() {
            return;
        }
        self.frames_requested = frames_requested;
        self.frames_done = 0;
        self.next_frame_index = 0;
        let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
        self.filename_stem = format!("{}-{}", sanitize_title(game_title), timestamp);
    }

    /// Every requested frame has been finalized.
    pub fn is_done(&self) -> bool {
        self.frames_done >= self.frames_requested
    }

    /// 0-based index of the next dump to begin.
    pub fn next_frame_index(&self) -> u32 {
        self.next_frame_index
    }

    pub fn frames_requested(&self) -> u32 {
        self.frames_requested
    }

    pub fn frames_done(&self) -> u32 {
        self.frames_done
    }

    pub fn record_frame_started(&mut self) {
        self.next_frame_index += 1;
    }

    pub fn record_frame_done(&mut self) {
        self.frames_done += 1;
    }

    /// Output filename for the dump with the given frame index. The
    /// `_f<index>` disambiguator appears only on multi-frame requests.
    pub fn frame_filename(&self, index: u32) -> String {
        if self.frames_requested > 1 {
            format!("{}_f{}.dump", self.filename_stem, index)
        } else {
            format!("{}.dump", self.filename_stem)
        }
    }
}

impl Default for RipRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep only lowercased ASCII alphanumerics from the title. Cart header
/// titles are short fixed-length ASCII fields; homebrew often leaves them
/// blank, so an empty result falls back to a fixed stem.
fn sanitize_title(title: &str) -> String {
    let s: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if s.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        s
    }
}
