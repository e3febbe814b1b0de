//! Notification tone recipes and sound file validation.
//!
//! Presets are short synthesized tones, so playback never depends on any
//! sound file shipping with the binary. User-provided files are validated
//! by extension before they are accepted.

use std::path::Path;

use super::error::SoundError;
use crate::types::SoundPreset;

/// A synthesized notification tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Sine frequency in hertz.
    pub frequency: f32,
    /// Playback length in milliseconds.
    pub duration_ms: u64,
    /// Linear gain applied to the sine.
    pub amplitude: f32,
}

/// Tone used when no notification sound has been selected.
pub const DEFAULT_TONE: Tone = Tone {
    frequency: 800.0,
    duration_ms: 500,
    amplitude: 0.30,
};

/// Returns the tone recipe for a preset.
#[must_use]
pub fn tone_for_preset(preset: SoundPreset) -> Tone {
    match preset {
        SoundPreset::Bell => Tone {
            frequency: 880.0,
            duration_ms: 600,
            amplitude: 0.30,
        },
        SoundPreset::Chime => Tone {
            frequency: 1320.0,
            duration_ms: 400,
            amplitude: 0.25,
        },
        SoundPreset::Beep => Tone {
            frequency: 440.0,
            duration_ms: 300,
            amplitude: 0.30,
        },
    }
}

/// Audio file extensions the player can decode.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac"];

/// Validates a user-provided sound file.
///
/// # Errors
///
/// Returns `SoundError::UnsupportedFormat` for an extension outside
/// `SUPPORTED_EXTENSIONS` and `SoundError::FileNotFound` when the path is
/// not an existing file.
pub fn validate_sound_file(path: &Path) -> Result<(), SoundError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(SoundError::UnsupportedFormat(path.display().to_string()));
    }

    if !path.is_file() {
        return Err(SoundError::FileNotFound(path.display().to_string()));
    }

    Ok(())
}
