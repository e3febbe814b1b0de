//! Mirror channel to a secondary display surface.
//!
//! The daemon owns exactly one optional mirror surface (the floating
//! bubble). Snapshots are pushed through `MirrorChannel::publish`; user
//! commands issued on the surface travel back as `MirrorEvent`s. A surface
//! that disappears on its own is detected on the next publish or through a
//! detach event, after which the channel can be opened again.

pub mod surface;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::SessionSnapshot;

pub use surface::{attach_channel, AttachFactory, AttachQueue, StreamSurface};

// ============================================================================
// Errors
// ============================================================================

/// Mirror surface errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// No surface is available to adopt
    #[error("表示先サーフェスが見つかりません")]
    Unavailable,

    /// The surface has been closed
    #[error("サーフェスは閉じられています")]
    Closed,

    /// Snapshot serialization failed
    #[error("スナップショットの直列化に失敗しました: {0}")]
    Serialize(String),
}

impl SurfaceError {
    /// Returns true for the no-surface-available case.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SurfaceError::Unavailable)
    }

    /// Returns true when the surface is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, SurfaceError::Closed)
    }
}

// ============================================================================
// Commands and Events
// ============================================================================

/// Commands a mirror surface can send back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum MirrorCommand {
    /// Start or pause the countdown
    ToggleTimer,
    /// Reset the countdown
    ResetTimer,
    /// Close the mirror
    Close,
    /// Close the mirror and return to the main surface
    Expand,
}

/// Events produced by a live mirror surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorEvent {
    /// A command arrived from the surface
    Command {
        /// Id of the originating surface
        surface_id: u64,
        /// The relayed command
        command: MirrorCommand,
    },
    /// The surface disconnected on its own
    Detached {
        /// Id of the detached surface
        surface_id: u64,
    },
}

// ============================================================================
// Surface Traits
// ============================================================================

/// A secondary display surface that renders session snapshots.
pub trait MirrorSurface: Send {
    /// Returns the unique id of this surface.
    fn id(&self) -> u64;

    /// Renders a snapshot on the surface.
    ///
    /// # Errors
    ///
    /// Returns `SurfaceError::Closed` when the surface has gone away.
    fn render(&mut self, snapshot: &SessionSnapshot) -> Result<(), SurfaceError>;

    /// Closes the surface.
    fn close(&mut self);
}

/// Source of mirror surfaces.
pub trait SurfaceFactory: Send {
    /// Acquires the next available surface.
    ///
    /// # Errors
    ///
    /// Returns `SurfaceError::Unavailable` when no surface is ready.
    fn acquire(&mut self) -> Result<Box<dyn MirrorSurface>, SurfaceError>;
}

// ============================================================================
// MirrorChannel
// ============================================================================

/// Owns the optional mirror surface and its lifecycle.
pub struct MirrorChannel {
    factory: Box<dyn SurfaceFactory>,
    surface: Option<Box<dyn MirrorSurface>>,
}

impl MirrorChannel {
    /// Creates a closed channel over the given surface source.
    pub fn new(factory: Box<dyn SurfaceFactory>) -> Self {
        Self {
            factory,
            surface: None,
        }
    }

    /// Opens the channel by adopting the next available surface.
    ///
    /// Opening an already-open channel is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SurfaceError::Unavailable` when no surface is ready; the
    /// channel stays closed and the main surface is unaffected.
    pub fn open(&mut self) -> Result<(), SurfaceError> {
        if self.surface.is_some() {
            return Ok(());
        }

        self.surface = Some(self.factory.acquire()?);
        Ok(())
    }

    /// Publishes a snapshot to the surface.
    ///
    /// A closed channel ignores the snapshot. A render failure means the
    /// surface disappeared externally; the channel marks itself closed so
    /// a later `open` can adopt a fresh surface.
    ///
    /// # Errors
    ///
    /// Returns the render error after the channel has resynchronized.
    pub fn publish(&mut self, snapshot: &SessionSnapshot) -> Result<(), SurfaceError> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };

        match surface.render(snapshot) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.surface = None;
                Err(err)
            }
        }
    }

    /// Closes the channel and tears the surface down. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.close();
        }
    }

    /// Returns true while a surface is adopted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.surface.is_some()
    }

    /// Returns the id of the adopted surface, if any.
    #[must_use]
    pub fn surface_id(&self) -> Option<u64> {
        self.surface.as_ref().map(|s| s.id())
    }
}

// ============================================================================
// Mock Implementations
// ============================================================================

/// Mock surface recording rendered snapshots.
#[derive(Clone)]
pub struct MockSurface {
    inner: std::sync::Arc<MockSurfaceState>,
}

struct MockSurfaceState {
    id: u64,
    rendered: std::sync::Mutex<Vec<SessionSnapshot>>,
    fail_render: std::sync::atomic::AtomicBool,
    close_count: std::sync::atomic::AtomicU32,
}

impl MockSurface {
    pub fn new(id: u64) -> Self {
        Self {
            inner: std::sync::Arc::new(MockSurfaceState {
                id,
                rendered: std::sync::Mutex::new(Vec::new()),
                fail_render: std::sync::atomic::AtomicBool::new(false),
                close_count: std::sync::atomic::AtomicU32::new(0),
            }),
        }
    }

    /// Makes every subsequent render fail as externally closed.
    pub fn set_fail_render(&self, fail: bool) {
        self.inner
            .fail_render
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    #[must_use]
    pub fn rendered_snapshots(&self) -> Vec<SessionSnapshot> {
        self.inner.rendered.lock().unwrap().clone()
    }

    #[must_use]
    pub fn render_count(&self) -> usize {
        self.inner.rendered.lock().unwrap().len()
    }

    #[must_use]
    pub fn close_count(&self) -> u32 {
        self.inner
            .close_count
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl MirrorSurface for MockSurface {
    fn id(&self) -> u64 {
        self.inner.id
    }

    fn render(&mut self, snapshot: &SessionSnapshot) -> Result<(), SurfaceError> {
        if self
            .inner
            .fail_render
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(SurfaceError::Closed);
        }
        self.inner.rendered.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.inner
            .close_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Mock factory serving surfaces from a prepared queue.
pub struct MockSurfaceFactory {
    queue: std::sync::Mutex<std::collections::VecDeque<MockSurface>>,
    acquire_count: std::sync::atomic::AtomicU32,
}

impl MockSurfaceFactory {
    pub fn new() -> Self {
        Self {
            queue: std::sync::Mutex::new(std::collections::VecDeque::new()),
            acquire_count: std::sync::atomic::AtomicU32::new(0),
        }
    }

    /// Queues a surface for the next acquire.
    pub fn push(&self, surface: MockSurface) {
        self.queue.lock().unwrap().push_back(surface);
    }

    #[must_use]
    pub fn acquire_count(&self) -> u32 {
        self.acquire_count
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl Default for MockSurfaceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceFactory for MockSurfaceFactory {
    fn acquire(&mut self) -> Result<Box<dyn MirrorSurface>, SurfaceError> {
        self.acquire_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .map(|s| Box::new(s) as Box<dyn MirrorSurface>)
            .ok_or(SurfaceError::Unavailable)
    }
}

// ============================================================================
// Tests
// ============================================================================
