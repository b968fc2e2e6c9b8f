//! # PlayerConfig
//!
//! The persisted configuration object (`spec.md` §6 "Persisted state").
//! Loading and saving the blob is a collaborator's responsibility — this
//! crate only owns the shape, so a host application can round-trip the
//! whole thing through one type instead of a side channel
//! (`SPEC_FULL.md` §10.3).

use crate::notation::NotationKind;
use crate::voicing::VoicingKind;
use serde::{Deserialize, Serialize};

const MAX_RECENT_FILES: usize = 10;

/// Window placement, carried verbatim for the editor; this crate never
/// reads or writes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self { x: 0, y: 0, width: 1024, height: 768 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub initial_bpm: u32,
    pub notation: NotationKind,
    pub voicing: VoicingKind,
    pub instrument_program: u8,
    pub font_family: String,
    pub font_size: u32,
    pub window_geometry: WindowGeometry,
    recent_files: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_bpm: 120,
            notation: NotationKind::American,
            voicing: VoicingKind::Piano,
            instrument_program: 0,
            font_family: "monospace".to_string(),
            font_size: 14,
            window_geometry: WindowGeometry::default(),
            recent_files: Vec::new(),
        }
    }
}

impl PlayerConfig {
    pub fn recent_files(&self) -> &[String] {
        &self.recent_files
    }

    /// Push `path` to the front of the recent-files list, de-duplicating
    /// and truncating to `spec.md` §6's cap of 10.
    pub fn push_recent_file(&mut self, path: String) {
        self.recent_files.retain(|existing| existing != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_playback_settings() {
        let config = PlayerConfig::default();
        assert_eq!(config.initial_bpm, 120);
        assert_eq!(config.voicing, VoicingKind::Piano);
    }

    #[test]
    fn recent_files_caps_at_ten_and_dedupes() {
        let mut config = PlayerConfig::default();
        for i in 0..12 {
            config.push_recent_file(format!("song-{i}.txt"));
        }
        assert_eq!(config.recent_files().len(), MAX_RECENT_FILES);
        assert_eq!(config.recent_files()[0], "song-11.txt");

        config.push_recent_file("song-11.txt".to_string());
        assert_eq!(config.recent_files().len(), MAX_RECENT_FILES);
        assert_eq!(config.recent_files()[0], "song-11.txt");
    }
}
