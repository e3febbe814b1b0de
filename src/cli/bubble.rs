//! Bubble view for the Pomofocus CLI.
//!
//! The bubble is a compact terminal mirror of the session: it attaches to
//! the daemon, renders every published snapshot, and relays a small set of
//! key commands back. Closing it (or the terminal) detaches the mirror and
//! the main CLI keeps working as before.

use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Sender};
use crossterm::cursor;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use serde::Serialize;

use crate::mirror::MirrorCommand;
use crate::types::{IpcRequest, IpcResponse, SessionSnapshot};

// ============================================================================
// BubbleAction
// ============================================================================

/// Actions that can be triggered from the bubble keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleAction {
    /// Start or pause the countdown
    Toggle,
    /// Reset the countdown
    Reset,
    /// Close the bubble and return to the main screen
    Expand,
    /// Close the bubble without touching the session
    Quit,
}

/// Maps a key press to a bubble action.
fn map_key(key: &KeyEvent) -> Option<BubbleAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(BubbleAction::Quit);
    }

    match key.code {
        KeyCode::Char(' ') => Some(BubbleAction::Toggle),
        KeyCode::Char('r') => Some(BubbleAction::Reset),
        KeyCode::Char('e') => Some(BubbleAction::Expand),
        KeyCode::Char('q') | KeyCode::Esc => Some(BubbleAction::Quit),
        _ => None,
    }
}

// ============================================================================
// BubbleEvent
// ============================================================================

/// Events fed into the bubble loop from the reader and keyboard threads.
#[derive(Debug)]
enum BubbleEvent {
    /// A snapshot frame arrived from the daemon
    Frame(IpcResponse),
    /// A key press mapped to an action
    Action(BubbleAction),
    /// The daemon connection closed
    Disconnected,
}

// ============================================================================
// BubbleView
// ============================================================================

/// Compact terminal mirror of the running session.
pub struct BubbleView {
    /// Socket path
    socket_path: PathBuf,
}

impl BubbleView {
    /// Creates a new bubble view for the given daemon socket.
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    /// Attaches to the daemon and runs the bubble until it is closed.
    ///
    /// Blocks the calling thread; the view owns the terminal while running.
    pub fn run(&self) -> Result<()> {
        let stream = UnixStream::connect(&self.socket_path)
            .context("Daemonに接続できません。'pomofocus daemon' を起動してください")?;
        let mut writer = stream.try_clone().context("ソケットの複製に失敗しました")?;
        send_json_line(&mut writer, &IpcRequest::Attach)?;

        // The daemon answers an attach with either an initial snapshot frame
        // or an error line (e.g. another bubble is already open).
        let mut reader = BufReader::new(stream);
        let first = read_frame(&mut reader)?;
        if !first.is_success() {
            anyhow::bail!("{}", first.message);
        }
        let mut snapshot = first
            .data
            .context("Daemonからスナップショットが届きませんでした")?;

        let (tx, rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        spawn_frame_reader(reader, tx.clone());
        spawn_key_reader(tx, Arc::clone(&stop));

        let disconnected = {
            let _guard = TerminalGuard::enter()?;
            let mut out = io::stdout();
            draw(&mut out, &snapshot)?;

            let mut disconnected = false;
            loop {
                match rx.recv() {
                    Ok(BubbleEvent::Frame(frame)) => {
                        if let Some(next) = frame.data {
                            snapshot = next;
                            draw(&mut out, &snapshot)?;
                        }
                    }
                    Ok(BubbleEvent::Action(BubbleAction::Toggle)) => {
                        send_json_line(&mut writer, &MirrorCommand::ToggleTimer)?;
                    }
                    Ok(BubbleEvent::Action(BubbleAction::Reset)) => {
                        send_json_line(&mut writer, &MirrorCommand::ResetTimer)?;
                    }
                    Ok(BubbleEvent::Action(BubbleAction::Expand)) => {
                        send_json_line(&mut writer, &MirrorCommand::Expand)?;
                        break;
                    }
                    Ok(BubbleEvent::Action(BubbleAction::Quit)) => {
                        let _ = send_json_line(&mut writer, &MirrorCommand::Close);
                        break;
                    }
                    Ok(BubbleEvent::Disconnected) | Err(_) => {
                        disconnected = true;
                        break;
                    }
                }
            }

            stop.store(true, Ordering::SeqCst);
            disconnected
        };

        if disconnected {
            anyhow::bail!("Daemonとの接続が切断されました");
        }

        println!("バブルを閉じました");
        Ok(())
    }
}

// ============================================================================
// Wire Helpers
// ============================================================================

/// Writes one value as a JSON line.
fn send_json_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let mut json = serde_json::to_vec(value).context("コマンドのシリアライズに失敗しました")?;
    json.push(b'\n');
    writer.write_all(&json).context("コマンドの送信に失敗しました")?;
    writer.flush().context("フラッシュに失敗しました")?;
    Ok(())
}

/// Reads one snapshot frame.
fn read_frame<R: BufRead>(reader: &mut R) -> Result<IpcResponse> {
    let mut line = String::new();
    let n = reader
        .read_line(&mut line)
        .context("フレームの受信に失敗しました")?;
    if n == 0 {
        anyhow::bail!("Daemonが接続を閉じました");
    }
    serde_json::from_str(line.trim()).context("フレームの解析に失敗しました")
}

/// Forwards snapshot frames from the daemon into the bubble loop.
fn spawn_frame_reader(mut reader: BufReader<UnixStream>, tx: Sender<BubbleEvent>) {
    thread::spawn(move || {
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => {
                    let _ = tx.send(BubbleEvent::Disconnected);
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<IpcResponse>(trimmed) {
                        Ok(frame) => {
                            if tx.send(BubbleEvent::Frame(frame)).is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!("フレームの解析に失敗しました: {}", e),
                    }
                }
                Err(e) => {
                    tracing::debug!("フレーム読み取りを終了します: {}", e);
                    let _ = tx.send(BubbleEvent::Disconnected);
                    break;
                }
            }
        }
    });
}

/// Forwards mapped key presses into the bubble loop.
fn spawn_key_reader(tx: Sender<BubbleEvent>, stop: Arc<AtomicBool>) {
    thread::spawn(move || {
        while !stop.load(Ordering::SeqCst) {
            match event::poll(Duration::from_millis(200)) {
                Ok(true) => {
                    if let Ok(Event::Key(key)) = event::read() {
                        if let Some(action) = map_key(&key) {
                            if tx.send(BubbleEvent::Action(action)).is_err() {
                                break;
                            }
                        }
                    }
                }
                Ok(false) => {}
                Err(_) => break,
            }
        }
    });
}

// ============================================================================
// Rendering
// ============================================================================

/// Renders the bubble content as plain lines.
fn render_lines(snapshot: &SessionSnapshot) -> Vec<String> {
    let marker = if snapshot.is_running { ">" } else { "||" };
    let task = snapshot.active_task_text.as_deref().unwrap_or("なし");

    vec![
        format!("{} {}", marker, snapshot.mode_label),
        snapshot.formatted_time(),
        format!("タスク: {}", task),
        format!("完了ポモドーロ: {}", snapshot.completed_pomodoros),
        String::new(),
        "Space: 開始/停止  r: リセット  e: メイン画面へ  q: 終了".to_string(),
    ]
}

/// Draws the snapshot onto the terminal.
fn draw<W: Write>(out: &mut W, snapshot: &SessionSnapshot) -> Result<()> {
    queue!(out, Clear(ClearType::All), cursor::MoveTo(0, 0))
        .context("画面のクリアに失敗しました")?;

    for (row, line) in render_lines(snapshot).iter().enumerate() {
        queue!(out, cursor::MoveTo(0, row as u16), Print(line))
            .context("画面の描画に失敗しました")?;
    }

    out.flush().context("画面の反映に失敗しました")?;
    Ok(())
}

// ============================================================================
// TerminalGuard
// ============================================================================

/// Puts the terminal into bubble mode and restores it on drop, so the
/// terminal comes back even when the loop exits with an error.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("rawモードへの切り替えに失敗しました")?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)
            .context("画面の初期化に失敗しました")?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

// ============================================================================
// Tests
// ============================================================================
