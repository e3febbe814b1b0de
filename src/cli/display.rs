//! Display utilities for the Pomofocus CLI.
//!
//! This module provides formatted output for:
//! - Command confirmation messages
//! - Error messages
//! - Status display
//! - Task list display

use crate::types::{IpcResponse, TaskStatus, TaskView};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of a timer toggle.
    pub fn show_toggle(response: &IpcResponse) {
        let marker = match &response.data {
            Some(data) if data.is_running => ">",
            _ => "||",
        };
        println!("{} {}", marker, response.message);

        if let Some(data) = &response.data {
            println!("  残り時間: {}", data.formatted_time());
        }
    }

    /// Shows the result of a timer reset.
    pub fn show_reset(response: &IpcResponse) {
        println!("[] {}", response.message);

        if let Some(data) = &response.data {
            println!("  残り時間: {}", data.formatted_time());
        }
    }

    /// Shows a plain confirmation message.
    pub fn show_success(response: &IpcResponse) {
        println!("* {}", response.message);
    }

    /// Shows the current session status.
    pub fn show_status(response: &IpcResponse) {
        println!("Pomofocus ステータス");
        println!("─────────────────────────────");

        if let Some(data) = &response.data {
            let state = if data.is_running {
                "実行中"
            } else {
                "一時停止中"
            };
            println!("モード: {}", data.mode_label);
            println!("状態: {}", state);
            println!("残り時間: {}", data.formatted_time());
            println!("完了ポモドーロ: {}", data.completed_pomodoros);

            match &data.active_task_text {
                Some(task) => println!("タスク: {}", task),
                None => println!("タスク: なし"),
            }

            if let Some(alert) = &data.alert {
                println!("通知: {} {}", alert.title, alert.body);
            }
        } else {
            println!("タイマーは起動していません");
        }
    }

    /// Shows the task list.
    pub fn show_task_list(response: &IpcResponse) {
        println!("タスク一覧");
        println!("─────────────────────────────");

        let tasks = match &response.data {
            Some(data) if !data.tasks.is_empty() => &data.tasks,
            _ => {
                println!("タスクはありません");
                return;
            }
        };

        for task in tasks {
            println!(
                "{} {}. {} ({})",
                Self::task_marker(task),
                task.id,
                task.text,
                Self::format_spent(task.time_spent)
            );
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Returns the list marker for a task.
    fn task_marker(task: &TaskView) -> &'static str {
        match task.status {
            TaskStatus::Completed => "[x]",
            TaskStatus::InProgress => "[>]",
            TaskStatus::Pending => "[ ]",
        }
    }

    /// Formats accrued focus time as `MM:SS`.
    fn format_spent(total_seconds: u32) -> String {
        format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
    }
}

// ============================================================================
// Tests
// ============================================================================
