//! Sound player implementation using rodio.

use std::fs::File;
use std::io::BufReader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rodio::source::{SineWave, Source};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::error::SoundError;
use super::source::{tone_for_preset, Tone, DEFAULT_TONE};
use crate::types::SoundSpec;

/// A sound player that uses rodio for audio playback.
///
/// The player is thread-safe and can be shared through `Arc`. Playback is
/// non-blocking; sounds continue after the call returns.
pub struct RodioSoundPlayer {
    /// The audio output stream (must be kept alive for playback).
    _stream: OutputStream,
    /// Handle to the output stream for creating sinks.
    stream_handle: OutputStreamHandle,
    /// Whether sound playback is disabled.
    disabled: AtomicBool,
}

impl RodioSoundPlayer {
    /// Creates a new sound player.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new(disabled: bool) -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        debug!("オーディオ出力ストリームを初期化しました");

        Ok(Self {
            _stream: stream,
            stream_handle,
            disabled: AtomicBool::new(disabled),
        })
    }

    /// Creates a disabled sound player.
    ///
    /// All calls to `play` will silently succeed without producing sound.
    ///
    /// # Errors
    ///
    /// May still fail if the audio stream cannot be initialized.
    pub fn disabled() -> Result<Self, SoundError> {
        Self::new(true)
    }

    /// Plays the configured notification sound.
    ///
    /// `None` plays the default tone. A file that fails to open or decode
    /// falls back to the default tone so the notification is still heard.
    ///
    /// # Errors
    ///
    /// Returns an error if audio playback itself fails.
    pub fn play(&self, spec: Option<&SoundSpec>) -> Result<(), SoundError> {
        if self.disabled.load(Ordering::Relaxed) {
            debug!("サウンド再生は無効化されています");
            return Ok(());
        }

        match spec {
            None => self.play_tone(DEFAULT_TONE),
            Some(SoundSpec::Preset { preset }) => self.play_tone(tone_for_preset(*preset)),
            Some(SoundSpec::File { path }) => match self.play_file(path) {
                Ok(()) => Ok(()),
                Err(e) => {
                    warn!(
                        "サウンドファイルの再生に失敗したため既定のトーンで再生します: {}",
                        e
                    );
                    self.play_tone(DEFAULT_TONE)
                }
            },
        }
    }

    /// Plays a synthesized tone.
    fn play_tone(&self, tone: Tone) -> Result<(), SoundError> {
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| SoundError::StreamError(e.to_string()))?;

        let mut source =
            SineWave::new(tone.frequency).take_duration(Duration::from_millis(tone.duration_ms));
        source.set_filter_fadeout();

        sink.append(source.amplify(tone.amplitude));
        sink.detach();

        debug!("トーン再生を開始しました ({}Hz)", tone.frequency);
        Ok(())
    }

    /// Plays a sound file from the filesystem.
    fn play_file(&self, path: &std::path::Path) -> Result<(), SoundError> {
        let file = File::open(path)
            .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;

        let reader = BufReader::new(file);
        let decoder = Decoder::new(reader).map_err(|e| SoundError::DecodeError(e.to_string()))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| SoundError::StreamError(e.to_string()))?;

        sink.append(decoder);
        sink.detach();

        debug!("サウンドファイルの再生を開始しました: {}", path.display());
        Ok(())
    }

    /// Returns true if sound playback is currently disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    /// Enables sound playback.
    pub fn enable(&self) {
        self.disabled.store(false, Ordering::Relaxed);
        debug!("サウンド再生を有効化しました");
    }

    /// Disables sound playback.
    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Relaxed);
        debug!("サウンド再生を無効化しました");
    }

    /// Returns true if the audio system is available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for RodioSoundPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioSoundPlayer")
            .field("disabled", &self.disabled.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Creates a sound player, returning None if audio is unavailable.
///
/// If audio initialization fails a warning is logged and the session runs
/// without sound.
#[must_use]
pub fn try_create_player(disabled: bool) -> Option<Arc<RodioSoundPlayer>> {
    match RodioSoundPlayer::new(disabled) {
        Ok(player) => Some(Arc::new(player)),
        Err(e) => {
            warn!("オーディオが利用できないためサウンドなしで動作します: {}", e);
            None
        }
    }
}
