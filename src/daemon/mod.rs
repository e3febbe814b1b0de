//! Daemon runtime for Pomofocus.
//!
//! This module contains the long-running session loop:
//! - `ipc`: Unix socket server and request dispatch
//! - the one-second ticker driving the countdown
//! - event fan-out (notifications, sounds, mirror publication)
//! - bubble attach handling and mirror command relay

pub mod ipc;

pub use ipc::{IpcServer, RequestHandler, DEFAULT_SOCKET_PATH};

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::UnixStream;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::messages::RandomMessages;
use crate::mirror::{
    attach_channel, AttachQueue, MirrorChannel, MirrorCommand, MirrorEvent, StreamSurface,
};
use crate::notify::{Notifier, TracingNotifier};
use crate::session::{SessionController, SessionEvent};
use crate::sound::{try_create_player, SoundPlayer};
use crate::types::{IpcRequest, IpcResponse, TimerConfig};

/// Runs the daemon until a shutdown request or Ctrl-C arrives.
///
/// One session controller owns all state; connections, the ticker and the
/// mirror all funnel into this loop.
pub async fn run(socket_path: &Path) -> Result<()> {
    let server = IpcServer::new(socket_path)?;
    info!("デーモンを開始しました: {:?}", server.socket_path());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let controller = Arc::new(Mutex::new(SessionController::new(
        TimerConfig::default(),
        Box::new(RandomMessages),
        event_tx,
    )));
    let handler = Arc::new(RequestHandler::new(Arc::clone(&controller)));

    let player = try_create_player(false);
    let notifier = TracingNotifier;

    let (mirror_tx, mut mirror_rx) = mpsc::unbounded_channel::<MirrorEvent>();
    let (attach_queue, attach_factory) = attach_channel();
    let mut mirror = MirrorChannel::new(Box::new(attach_factory));

    let (pending_tx, mut pending_rx) = mpsc::unbounded_channel::<UnixStream>();
    let (shutdown_tx, mut shutdown_rx) = mpsc::unbounded_channel::<()>();

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                controller.lock().await.tick();
            }
            result = server.accept() => {
                match result {
                    Ok(stream) => {
                        let handler = Arc::clone(&handler);
                        let pending_tx = pending_tx.clone();
                        let shutdown_tx = shutdown_tx.clone();
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(stream, handler, pending_tx, shutdown_tx).await
                            {
                                debug!("接続処理を終了しました: {}", e);
                            }
                        });
                    }
                    Err(e) => warn!("接続の受け付けに失敗しました: {}", e),
                }
            }
            Some(event) = event_rx.recv() => {
                dispatch_side_effects(&event, player.as_deref(), &notifier);
                while let Ok(event) = event_rx.try_recv() {
                    dispatch_side_effects(&event, player.as_deref(), &notifier);
                }
                publish_snapshot(&controller, &mut mirror).await;
            }
            Some(stream) = pending_rx.recv() => {
                handle_attach(stream, &controller, &mut mirror, &attach_queue, &mirror_tx).await;
            }
            Some(event) = mirror_rx.recv() => {
                handle_mirror_event(event, &controller, &mut mirror).await;
            }
            Some(()) = shutdown_rx.recv() => {
                info!("シャットダウン要求を受信しました");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-Cを受信しました");
                break;
            }
        }
    }

    mirror.close();
    info!("デーモンを停止しました");
    Ok(())
}

/// Handles one client connection.
///
/// Commands are answered on the spot; `attach` hands the connection to the
/// session loop for the surface upgrade, `shutdown` is acknowledged before
/// the stop signal fires.
async fn handle_connection(
    mut stream: UnixStream,
    handler: Arc<RequestHandler>,
    pending_tx: mpsc::UnboundedSender<UnixStream>,
    shutdown_tx: mpsc::UnboundedSender<()>,
) -> Result<()> {
    let request = IpcServer::receive_request(&mut stream).await?;

    match request {
        IpcRequest::Attach => {
            if pending_tx.send(stream).is_err() {
                anyhow::bail!("セッションループが停止しています");
            }
        }
        IpcRequest::Shutdown => {
            let response = IpcResponse::success("デーモンを停止します", None);
            IpcServer::send_response(&mut stream, &response).await?;
            let _ = shutdown_tx.send(());
        }
        request => {
            let response = handler.handle(request).await;
            IpcServer::send_response(&mut stream, &response).await?;
        }
    }

    Ok(())
}

/// Plays sounds and dispatches alerts for the events that carry them.
fn dispatch_side_effects<P, N>(event: &SessionEvent, player: Option<&P>, notifier: &N)
where
    P: SoundPlayer + ?Sized,
    N: Notifier + ?Sized,
{
    match event {
        SessionEvent::Completed { alert, sound, .. } => {
            notifier.notify(alert);
            if let Some(player) = player {
                if let Err(e) = player.play(sound.as_ref()) {
                    warn!("通知音の再生に失敗しました: {}", e);
                }
            }
        }
        SessionEvent::IncompleteTask { alert, .. } => {
            notifier.notify(alert);
        }
        _ => {}
    }
}

/// Publishes the current snapshot to the mirror, if one is attached.
async fn publish_snapshot(controller: &Arc<Mutex<SessionController>>, mirror: &mut MirrorChannel) {
    if !mirror.is_open() {
        return;
    }

    let snapshot = controller.lock().await.snapshot();
    if let Err(e) = mirror.publish(&snapshot) {
        warn!("ミラーへの配信に失敗しました（切断を検出）: {}", e);
    }
}

/// Adopts an attach connection as the mirror surface.
///
/// While a bubble is already attached the new connection is refused so
/// there is never more than one mirror.
async fn handle_attach(
    mut stream: UnixStream,
    controller: &Arc<Mutex<SessionController>>,
    mirror: &mut MirrorChannel,
    attach_queue: &AttachQueue,
    mirror_tx: &mpsc::UnboundedSender<MirrorEvent>,
) {
    if mirror.is_open() {
        let response = IpcResponse::error("バブルは既に表示されています");
        if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
            debug!("応答の送信に失敗しました: {}", e);
        }
        return;
    }

    let surface = StreamSurface::spawn(stream, mirror_tx.clone());
    attach_queue.offer(Box::new(surface));

    match mirror.open() {
        Ok(()) => {
            info!("バブルを接続しました");
            publish_snapshot(controller, mirror).await;
        }
        Err(e) => warn!("バブルの接続に失敗しました: {}", e),
    }
}

/// Applies a mirror event against the current surface.
///
/// Events from a surface that is no longer adopted are ignored; they can
/// arrive late when a bubble is replaced.
async fn handle_mirror_event(
    event: MirrorEvent,
    controller: &Arc<Mutex<SessionController>>,
    mirror: &mut MirrorChannel,
) {
    match event {
        MirrorEvent::Command {
            surface_id,
            command,
        } => {
            if mirror.surface_id() != Some(surface_id) {
                debug!("切断済みサーフェスからのコマンドを無視します");
                return;
            }

            match command {
                MirrorCommand::ToggleTimer => controller.lock().await.toggle_timer(),
                MirrorCommand::ResetTimer => controller.lock().await.reset_timer(),
                MirrorCommand::Close => {
                    info!("バブルを閉じます");
                    mirror.close();
                }
                MirrorCommand::Expand => {
                    info!("バブルを閉じてメイン画面に戻ります");
                    mirror.close();
                }
            }
        }
        MirrorEvent::Detached { surface_id } => {
            if mirror.surface_id() == Some(surface_id) {
                info!("バブルが切断されました");
                mirror.close();
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
