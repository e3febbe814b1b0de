//! IPC Client for communicating with the Pomofocus daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Newline-delimited JSON request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::daemon::DEFAULT_SOCKET_PATH;
use crate::types::{IpcRequest, IpcResponse, Mode, SoundSpec, TimerConfig};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// Socket Path Resolution
// ============================================================================

/// Resolves the socket path, expanding the default's leading `~`.
pub fn resolve_socket_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = custom {
        return Ok(path);
    }

    let relative = DEFAULT_SOCKET_PATH
        .strip_prefix("~/")
        .unwrap_or(DEFAULT_SOCKET_PATH);
    let home = dirs::home_dir().context("ホームディレクトリを特定できません")?;
    Ok(home.join(relative))
}

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    pub fn new() -> Result<Self> {
        let socket_path = resolve_socket_path(None)?;
        Ok(Self::with_socket_path(socket_path))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Starts or pauses the countdown.
    pub async fn toggle(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::ToggleTimer).await
    }

    /// Resets the countdown to the full duration.
    pub async fn reset(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::ResetTimer).await
    }

    /// Switches the timer mode.
    pub async fn switch_mode(&self, mode: Mode) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::SwitchMode { mode })
            .await
    }

    /// Replaces the duration configuration.
    pub async fn update_settings(&self, config: TimerConfig) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::UpdateSettings { config })
            .await
    }

    /// Adds a task.
    pub async fn add_task(&self, text: impl Into<String>) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::AddTask { text: text.into() })
            .await
    }

    /// Starts focusing on a task.
    pub async fn start_task(&self, id: u64) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::StartTask { id })
            .await
    }

    /// Toggles a task between completed and pending.
    pub async fn toggle_task(&self, id: u64) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::ToggleTask { id })
            .await
    }

    /// Deletes a task.
    pub async fn delete_task(&self, id: u64) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::DeleteTask { id })
            .await
    }

    /// Selects the notification sound; `None` restores the default tone.
    pub async fn set_sound(&self, sound: Option<SoundSpec>) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::SetNotificationSound { sound })
            .await
    }

    /// Queries the current snapshot.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Status).await
    }

    /// Stops the daemon.
    pub async fn shutdown(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Shutdown).await
    }

    /// Sends a request to the daemon with retry logic.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.send_request(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!("リクエスト失敗 (試行 {}/{}): {}", attempt, MAX_RETRIES, e);
                    last_error = Some(e);

                    if attempt < MAX_RETRIES {
                        let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap())
    }

    /// Sends a single request to the daemon.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        // Connect with timeout
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("接続がタイムアウトしました")?
            .context("Daemonに接続できません。'pomofocus daemon' を起動してください")?;

        // Serialize request as one JSON line
        let mut request_json =
            serde_json::to_vec(request).context("リクエストのシリアライズに失敗しました")?;
        request_json.push(b'\n');

        // Send request with timeout
        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(&request_json),
        )
        .await
        .context("書き込みがタイムアウトしました")?
        .context("リクエストの送信に失敗しました")?;

        timeout(Duration::from_secs(IO_TIMEOUT_SECS), stream.flush())
            .await
            .context("フラッシュがタイムアウトしました")?
            .context("フラッシュに失敗しました")?;

        // Read one response line with timeout
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let n = timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            reader.read_line(&mut line),
        )
        .await
        .context("読み込みがタイムアウトしました")?
        .context("レスポンスの受信に失敗しました")?;

        if n == 0 {
            anyhow::bail!("Daemonからの応答がありませんでした");
        }

        // Deserialize response
        let response: IpcResponse =
            serde_json::from_str(line.trim()).context("レスポンスのパースに失敗しました")?;

        // Check for error response
        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
