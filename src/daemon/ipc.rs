//! IPC Server for the Pomofocus daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Newline-delimited JSON request/response framing
//! - Request dispatch into the session controller

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

use crate::session::SessionController;
use crate::types::{IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

/// Default socket path
pub const DEFAULT_SOCKET_PATH: &str = "~/.pomofocus/pomofocus.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Socket binding error
    #[error("Failed to bind socket: {0}")]
    BindError(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Write error
    #[error("Failed to write response: {0}")]
    WriteError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        // Remove existing socket file if present
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives one newline-terminated IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely. The stream
    /// itself stays usable, so an `attach` request can upgrade the same
    /// connection afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer: Vec<u8> = Vec::with_capacity(256);
        let mut chunk = [0u8; 1024];

        loop {
            let read_result = timeout(
                Duration::from_secs(READ_TIMEOUT_SECS),
                stream.read(&mut chunk),
            )
            .await;

            let n = match read_result {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
                Err(_) => return Err(IpcError::Timeout.into()),
            };

            if n == 0 {
                if buffer.is_empty() {
                    anyhow::bail!("Connection closed by client");
                }
                break;
            }

            buffer.extend_from_slice(&chunk[..n]);
            if buffer.len() > MAX_REQUEST_SIZE {
                return Err(IpcError::RequestTooLarge.into());
            }
            if buffer.contains(&b'\n') {
                break;
            }
        }

        let line = String::from_utf8_lossy(&buffer);
        let request: IpcRequest = serde_json::from_str(line.trim())
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response as one line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let mut json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;
        json.push(b'\n');

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching into the session controller.
pub struct RequestHandler {
    /// Shared reference to the session controller
    controller: Arc<Mutex<SessionController>>,
}

impl RequestHandler {
    /// Creates a new request handler over the given controller.
    pub fn new(controller: Arc<Mutex<SessionController>>) -> Self {
        Self { controller }
    }

    /// Handles an IPC request and returns the appropriate response.
    ///
    /// `attach` and `shutdown` are connection-level requests resolved by
    /// the session loop before dispatch reaches this handler.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::ToggleTimer => self.handle_toggle_timer().await,
            IpcRequest::ResetTimer => self.handle_reset_timer().await,
            IpcRequest::SwitchMode { mode } => self.handle_switch_mode(mode).await,
            IpcRequest::UpdateSettings { config } => self.handle_update_settings(config).await,
            IpcRequest::AddTask { text } => self.handle_add_task(text).await,
            IpcRequest::StartTask { id } => self.handle_start_task(id).await,
            IpcRequest::ToggleTask { id } => self.handle_toggle_task(id).await,
            IpcRequest::DeleteTask { id } => self.handle_delete_task(id).await,
            IpcRequest::SetNotificationSound { sound } => self.handle_set_sound(sound).await,
            IpcRequest::Status => self.handle_status().await,
            IpcRequest::Attach | IpcRequest::Shutdown => {
                IpcResponse::error("接続制御コマンドはここでは処理できません")
            }
        }
    }

    /// Handles the toggleTimer command.
    async fn handle_toggle_timer(&self) -> IpcResponse {
        let mut controller = self.controller.lock().await;
        controller.toggle_timer();

        let message = if controller.is_running() {
            "タイマーを開始しました"
        } else {
            "タイマーを一時停止しました"
        };
        IpcResponse::success(message, Some(controller.snapshot()))
    }

    /// Handles the resetTimer command.
    async fn handle_reset_timer(&self) -> IpcResponse {
        let mut controller = self.controller.lock().await;
        controller.reset_timer();

        IpcResponse::success("タイマーをリセットしました", Some(controller.snapshot()))
    }

    /// Handles the switchMode command.
    async fn handle_switch_mode(&self, mode: crate::types::Mode) -> IpcResponse {
        let mut controller = self.controller.lock().await;
        controller.switch_mode(mode);

        IpcResponse::success(
            format!("{}モードに切り替えました", mode.label()),
            Some(controller.snapshot()),
        )
    }

    /// Handles the updateSettings command.
    async fn handle_update_settings(&self, config: crate::types::TimerConfig) -> IpcResponse {
        if let Err(e) = config.validate() {
            return IpcResponse::error(e);
        }

        let mut controller = self.controller.lock().await;
        controller.update_settings(config);

        IpcResponse::success("設定を更新しました", Some(controller.snapshot()))
    }

    /// Handles the addTask command.
    async fn handle_add_task(&self, text: String) -> IpcResponse {
        let mut controller = self.controller.lock().await;

        match controller.add_task(&text) {
            Ok(id) => IpcResponse::success(
                format!("タスクを追加しました (id: {})", id),
                Some(controller.snapshot()),
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the startTask command.
    async fn handle_start_task(&self, id: u64) -> IpcResponse {
        let mut controller = self.controller.lock().await;

        match controller.start_task(id) {
            Ok(()) => IpcResponse::success(
                format!("タスクを開始しました (id: {})", id),
                Some(controller.snapshot()),
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the toggleTask command.
    async fn handle_toggle_task(&self, id: u64) -> IpcResponse {
        let mut controller = self.controller.lock().await;

        match controller.toggle_task(id) {
            Ok(()) => IpcResponse::success(
                "タスクの状態を切り替えました",
                Some(controller.snapshot()),
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the deleteTask command.
    async fn handle_delete_task(&self, id: u64) -> IpcResponse {
        let mut controller = self.controller.lock().await;

        match controller.delete_task(id) {
            Ok(()) => IpcResponse::success("タスクを削除しました", Some(controller.snapshot())),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the setNotificationSound command.
    async fn handle_set_sound(&self, sound: Option<crate::types::SoundSpec>) -> IpcResponse {
        let mut controller = self.controller.lock().await;

        let message = match &sound {
            Some(spec) => format!("通知音を設定しました: {}", spec.describe()),
            None => "通知音を既定のトーンに戻しました".to_string(),
        };
        controller.set_notification_sound(sound);

        IpcResponse::success(message, Some(controller.snapshot()))
    }

    /// Handles the status command.
    async fn handle_status(&self) -> IpcResponse {
        let controller = self.controller.lock().await;
        IpcResponse::success("", Some(controller.snapshot()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use crate::messages::FixedMessages;
    use crate::session::SessionEvent;
    use crate::types::{Mode, SoundPreset, SoundSpec, TaskStatus, TimerConfig};

    // ------------------------------------------------------------------------
    // Helper functions
    // ------------------------------------------------------------------------

    fn create_temp_socket_path() -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sock");
        // Keep the directory so it's not deleted
        std::mem::forget(dir);
        path
    }

    fn create_controller() -> (
        Arc<Mutex<SessionController>>,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller =
            SessionController::new(TimerConfig::default(), Box::new(FixedMessages::new()), tx);
        (Arc::new(Mutex::new(controller)), rx)
    }

    // ------------------------------------------------------------------------
    // IpcServer Tests
    // ------------------------------------------------------------------------

    mod ipc_server_tests {
        use super::*;

        #[tokio::test]
        async fn test_server_creation() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path);

            assert!(server.is_ok());
            assert!(socket_path.exists());

            // Cleanup
            drop(server);
        }

        #[tokio::test]
        async fn test_server_removes_existing_socket() {
            let socket_path = create_temp_socket_path();

            // Create a dummy file at the socket path
            std::fs::write(&socket_path, "dummy").unwrap();

            // Server should remove it and bind successfully
            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
        }

        #[tokio::test]
        async fn test_server_creates_parent_directory() {
            let dir = tempfile::tempdir().unwrap();
            let socket_path = dir.path().join("subdir").join("test.sock");

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
            assert!(socket_path.parent().unwrap().exists());
        }

        #[tokio::test]
        async fn test_accept_connection() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            // Connect from client in background
            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                UnixStream::connect(&client_path).await
            });

            // Accept connection
            let stream = server.accept().await;
            assert!(stream.is_ok());

            let client_result = client_handle.await.unwrap();
            assert!(client_result.is_ok());
        }

        #[tokio::test]
        async fn test_receive_request_status() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            // Client sends status request
            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let request = "{\"command\":\"status\"}\n";
                stream.write_all(request.as_bytes()).await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            assert!(request.is_ok());
            assert!(matches!(request.unwrap(), IpcRequest::Status));

            client_handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_receive_request_switch_mode() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let request = "{\"command\":\"switchMode\",\"mode\":\"shortBreak\"}\n";
                stream.write_all(request.as_bytes()).await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            assert!(request.is_ok());
            if let IpcRequest::SwitchMode { mode } = request.unwrap() {
                assert_eq!(mode, Mode::ShortBreak);
            } else {
                panic!("Expected SwitchMode request");
            }

            client_handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_receive_request_without_trailing_newline() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            // A client that writes the request and half-closes is still valid
            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream
                    .write_all(b"{\"command\":\"toggleTimer\"}")
                    .await
                    .unwrap();
                stream.shutdown().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            assert!(matches!(request.unwrap(), IpcRequest::ToggleTimer));
            client_handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_send_response() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();

                // Read one response line
                let mut buffer = vec![0u8; 4096];
                let n = stream.read(&mut buffer).await.unwrap();
                assert_eq!(buffer[n - 1], b'\n');
                let response: IpcResponse = serde_json::from_slice(&buffer[..n]).unwrap();
                response
            });

            let mut stream = server.accept().await.unwrap();
            let response = IpcResponse::success("Test message", None);
            IpcServer::send_response(&mut stream, &response)
                .await
                .unwrap();

            let received = client_handle.await.unwrap();
            assert_eq!(received.status, "success");
            assert_eq!(received.message, "Test message");
        }

        #[tokio::test]
        async fn test_receive_request_invalid_json() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(b"not valid json\n").await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            assert!(request.is_err());
        }

        #[tokio::test]
        async fn test_receive_request_too_large() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let oversized = vec![b'x'; MAX_REQUEST_SIZE + 1];
                let _ = stream.write_all(&oversized).await;
            });

            let mut stream = server.accept().await.unwrap();
            let result = IpcServer::receive_request(&mut stream).await;

            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_socket_path_getter() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            assert_eq!(server.socket_path(), socket_path);
        }

        #[tokio::test]
        async fn test_server_drop_cleanup() {
            let socket_path = create_temp_socket_path();

            {
                let _server = IpcServer::new(&socket_path).unwrap();
                assert!(socket_path.exists());
            }

            // Socket file should be removed after drop
            assert!(!socket_path.exists());
        }
    }

    // ------------------------------------------------------------------------
    // RequestHandler Tests
    // ------------------------------------------------------------------------

    mod request_handler_tests {
        use super::*;

        #[tokio::test]
        async fn test_handle_status() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            let response = handler.handle(IpcRequest::Status).await;

            assert_eq!(response.status, "success");
            assert!(response.data.is_some());

            let data = response.data.unwrap();
            assert_eq!(data.mode, Mode::Pomodoro);
            assert_eq!(data.time_left, 1500);
            assert!(!data.is_running);
            assert_eq!(data.completed_pomodoros, 0);
        }

        #[tokio::test]
        async fn test_handle_toggle_timer() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            let response = handler.handle(IpcRequest::ToggleTimer).await;

            assert_eq!(response.status, "success");
            assert_eq!(response.message, "タイマーを開始しました");
            assert!(response.data.unwrap().is_running);

            let response = handler.handle(IpcRequest::ToggleTimer).await;
            assert_eq!(response.message, "タイマーを一時停止しました");
            assert!(!response.data.unwrap().is_running);
        }

        #[tokio::test]
        async fn test_handle_reset_timer() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            handler.handle(IpcRequest::ToggleTimer).await;
            let response = handler.handle(IpcRequest::ResetTimer).await;

            assert_eq!(response.status, "success");
            assert_eq!(response.message, "タイマーをリセットしました");

            let data = response.data.unwrap();
            assert_eq!(data.time_left, 1500);
            assert!(!data.is_running);
        }

        #[tokio::test]
        async fn test_handle_switch_mode() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            let response = handler
                .handle(IpcRequest::SwitchMode {
                    mode: Mode::ShortBreak,
                })
                .await;

            assert_eq!(response.status, "success");
            assert_eq!(response.message, "Short Breakモードに切り替えました");

            let data = response.data.unwrap();
            assert_eq!(data.mode, Mode::ShortBreak);
            assert_eq!(data.time_left, 300);
        }

        #[tokio::test]
        async fn test_handle_update_settings() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            let config = TimerConfig::default().with_pomodoro_seconds(600);
            let response = handler.handle(IpcRequest::UpdateSettings { config }).await;

            assert_eq!(response.status, "success");
            assert_eq!(response.message, "設定を更新しました");
            assert_eq!(response.data.unwrap().time_left, 600);
        }

        #[tokio::test]
        async fn test_handle_update_settings_invalid() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            let config = TimerConfig::default().with_pomodoro_seconds(0);
            let response = handler.handle(IpcRequest::UpdateSettings { config }).await;

            assert_eq!(response.status, "error");
            assert!(response.message.contains("ポモドーロ時間"));
        }

        #[tokio::test]
        async fn test_handle_add_task() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            let response = handler
                .handle(IpcRequest::AddTask {
                    text: "Write report".to_string(),
                })
                .await;

            assert_eq!(response.status, "success");
            assert!(response.message.contains("タスクを追加しました"));

            let data = response.data.unwrap();
            assert_eq!(data.tasks.len(), 1);
            assert_eq!(data.tasks[0].text, "Write report");
            assert_eq!(data.tasks[0].status, TaskStatus::Pending);
        }

        #[tokio::test]
        async fn test_handle_add_task_empty_text() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            let response = handler
                .handle(IpcRequest::AddTask {
                    text: "   ".to_string(),
                })
                .await;

            assert_eq!(response.status, "error");
            assert!(response.message.contains("タスク名"));
        }

        #[tokio::test]
        async fn test_handle_start_task() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller.clone());

            let added = handler
                .handle(IpcRequest::AddTask {
                    text: "Write report".to_string(),
                })
                .await;
            let id = added.data.unwrap().tasks[0].id;

            let response = handler.handle(IpcRequest::StartTask { id }).await;

            assert_eq!(response.status, "success");
            let data = response.data.unwrap();
            assert_eq!(data.active_task_id, Some(id));
            assert_eq!(data.active_task_text, Some("Write report".to_string()));
        }

        #[tokio::test]
        async fn test_handle_start_task_not_found() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            let response = handler.handle(IpcRequest::StartTask { id: 42 }).await;

            assert_eq!(response.status, "error");
            assert!(response.message.contains("タスクが見つかりません"));
        }

        #[tokio::test]
        async fn test_handle_toggle_and_delete_task() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            let added = handler
                .handle(IpcRequest::AddTask {
                    text: "Write report".to_string(),
                })
                .await;
            let id = added.data.unwrap().tasks[0].id;

            let response = handler.handle(IpcRequest::ToggleTask { id }).await;
            assert_eq!(response.status, "success");
            assert_eq!(response.data.unwrap().tasks[0].status, TaskStatus::Completed);

            let response = handler.handle(IpcRequest::DeleteTask { id }).await;
            assert_eq!(response.status, "success");
            assert!(response.data.unwrap().tasks.is_empty());
        }

        #[tokio::test]
        async fn test_handle_set_notification_sound() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            let response = handler
                .handle(IpcRequest::SetNotificationSound {
                    sound: Some(SoundSpec::preset(SoundPreset::Bell)),
                })
                .await;

            assert_eq!(response.status, "success");
            assert!(response.message.contains("bell"));

            let response = handler
                .handle(IpcRequest::SetNotificationSound { sound: None })
                .await;
            assert!(response.message.contains("既定のトーン"));
        }

        #[tokio::test]
        async fn test_handle_connection_level_requests_are_rejected() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            let response = handler.handle(IpcRequest::Attach).await;
            assert_eq!(response.status, "error");

            let response = handler.handle(IpcRequest::Shutdown).await;
            assert_eq!(response.status, "error");
        }
    }

    // ------------------------------------------------------------------------
    // Integration Tests
    // ------------------------------------------------------------------------

    mod integration_tests {
        use super::*;

        #[tokio::test]
        async fn test_full_ipc_flow() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            // Client sends a task command and reads the response line
            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();

                let request = "{\"command\":\"addTask\",\"text\":\"Integration Test\"}\n";
                stream.write_all(request.as_bytes()).await.unwrap();
                stream.flush().await.unwrap();

                let mut buffer = vec![0u8; 4096];
                let n = stream.read(&mut buffer).await.unwrap();
                serde_json::from_slice::<IpcResponse>(&buffer[..n]).unwrap()
            });

            // Server handles request
            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await.unwrap();
            let response = handler.handle(request).await;
            IpcServer::send_response(&mut stream, &response)
                .await
                .unwrap();

            // Verify client received correct response
            let client_response = client_handle.await.unwrap();
            assert_eq!(client_response.status, "success");

            let data = client_response.data.unwrap();
            assert_eq!(data.tasks.len(), 1);
            assert_eq!(data.tasks[0].text, "Integration Test");
        }

        #[tokio::test]
        async fn test_all_commands_flow() {
            let (controller, _rx) = create_controller();
            let handler = RequestHandler::new(controller);

            // Command sequence a typical session issues
            let commands = vec![
                "{\"command\":\"addTask\",\"text\":\"Write report\"}",
                "{\"command\":\"startTask\",\"id\":1}",
                "{\"command\":\"toggleTimer\"}",
                "{\"command\":\"toggleTimer\"}",
                "{\"command\":\"resetTimer\"}",
                "{\"command\":\"switchMode\",\"mode\":\"longBreak\"}",
                "{\"command\":\"status\"}",
            ];

            for cmd_json in commands {
                let request: IpcRequest = serde_json::from_str(cmd_json).unwrap();
                let response = handler.handle(request).await;
                assert_eq!(response.status, "success", "Command: {}", cmd_json);
            }

            let status = handler.handle(IpcRequest::Status).await;
            let data = status.data.unwrap();
            assert_eq!(data.mode, Mode::LongBreak);
            assert_eq!(data.time_left, 900);
        }
    }

    // ------------------------------------------------------------------------
    // Error Handling Tests
    // ------------------------------------------------------------------------

    mod error_tests {
        use super::*;

        #[tokio::test]
        async fn test_connection_closed() {
            let socket_path = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let stream = UnixStream::connect(&client_path).await.unwrap();
                // Close immediately without sending anything
                drop(stream);
            });

            let mut stream = server.accept().await.unwrap();
            let result = IpcServer::receive_request(&mut stream).await;

            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_ipc_error_display() {
            let err = IpcError::BindError("test error".to_string());
            assert_eq!(err.to_string(), "Failed to bind socket: test error");

            let err = IpcError::Timeout;
            assert_eq!(err.to_string(), "Operation timed out");

            let err = IpcError::RequestTooLarge;
            assert!(err.to_string().contains("4096"));
        }
    }
}
