//! Socket-backed mirror surface.
//!
//! An attached bubble client is upgraded into a `StreamSurface`: a writer
//! task pushes snapshot frames down the socket, a reader task parses
//! command lines coming back. Either direction failing marks the surface
//! closed and reports a detach so the session can accept a new bubble.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::mirror::{MirrorCommand, MirrorEvent, MirrorSurface, SurfaceError, SurfaceFactory};
use crate::types::{IpcResponse, SessionSnapshot};

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// StreamSurface
// ============================================================================

/// Mirror surface backed by an attached socket connection.
pub struct StreamSurface {
    id: u64,
    frame_tx: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

impl StreamSurface {
    /// Upgrades a connection into a surface, spawning its I/O tasks.
    ///
    /// Commands and the eventual detach are reported through `events`.
    pub fn spawn(stream: UnixStream, events: mpsc::UnboundedSender<MirrorEvent>) -> Self {
        let id = NEXT_SURFACE_ID.fetch_add(1, Ordering::SeqCst);
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<String>();
        let closed = Arc::new(AtomicBool::new(false));

        let (read_half, mut write_half) = stream.into_split();

        let writer_closed = Arc::clone(&closed);
        tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                if write_half.write_all(frame.as_bytes()).await.is_err() {
                    writer_closed.store(true, Ordering::SeqCst);
                    break;
                }
            }
        });

        let reader_closed = Arc::clone(&closed);
        tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<MirrorCommand>(line) {
                            Ok(command) => {
                                let event = MirrorEvent::Command {
                                    surface_id: id,
                                    command,
                                };
                                if events.send(event).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("ミラーコマンドの解析に失敗しました: {}", e);
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!("ミラー読み取りを終了します: {}", e);
                        break;
                    }
                }
            }
            reader_closed.store(true, Ordering::SeqCst);
            let _ = events.send(MirrorEvent::Detached { surface_id: id });
        });

        Self {
            id,
            frame_tx,
            closed,
        }
    }
}

impl MirrorSurface for StreamSurface {
    fn id(&self) -> u64 {
        self.id
    }

    fn render(&mut self, snapshot: &SessionSnapshot) -> Result<(), SurfaceError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SurfaceError::Closed);
        }

        let response = IpcResponse::success("状態を更新しました", Some(snapshot.clone()));
        let mut frame = serde_json::to_string(&response)
            .map_err(|e| SurfaceError::Serialize(e.to_string()))?;
        frame.push('\n');

        self.frame_tx
            .send(frame)
            .map_err(|_| SurfaceError::Closed)?;
        Ok(())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// Attach Queue
// ============================================================================

/// Creates the attach hand-off pair: connection side and session side.
pub fn attach_channel() -> (AttachQueue, AttachFactory) {
    let (tx, rx) = mpsc::unbounded_channel();
    (AttachQueue { tx }, AttachFactory { rx })
}

/// Hands upgraded surfaces over to the session loop.
pub struct AttachQueue {
    tx: mpsc::UnboundedSender<Box<dyn MirrorSurface>>,
}

impl AttachQueue {
    /// Offers a freshly upgraded surface for adoption.
    pub fn offer(&self, surface: Box<dyn MirrorSurface>) {
        if self.tx.send(surface).is_err() {
            warn!("サーフェスの受け渡しに失敗しました（受け側が閉じています）");
        }
    }
}

/// Serves surfaces queued by `AttachQueue::offer`.
pub struct AttachFactory {
    rx: mpsc::UnboundedReceiver<Box<dyn MirrorSurface>>,
}

impl SurfaceFactory for AttachFactory {
    fn acquire(&mut self) -> Result<Box<dyn MirrorSurface>, SurfaceError> {
        self.rx.try_recv().map_err(|_| SurfaceError::Unavailable)
    }
}

// ============================================================================
// Tests
// ============================================================================
