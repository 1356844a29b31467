//! CLI request layer: resolves the caller and calls into the note service.

pub mod create;
pub mod delete;
pub mod list;
pub mod search;
pub mod show;
pub mod status;
pub mod update;

use colored::Colorize;

use notevec::{Note, NoteService, UserId};

pub struct CommandContext {
    pub service: NoteService,
    pub caller: Option<UserId>,
    pub json: bool,
}

impl CommandContext {
    pub fn caller(&self) -> Option<&UserId> {
        self.caller.as_ref()
    }
}

/// First line of the body, truncated (char-aware) for list output.
fn preview(body: &str, max_chars: usize) -> String {
    let line = body.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.chars().count() > max_chars {
        format!("{}...", line.chars().take(max_chars).collect::<String>())
    } else {
        line.to_string()
    }
}

fn print_note_summary(index: usize, note: &Note) {
    let created = chrono::DateTime::from_timestamp_millis(note.created_at)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!(
        "{}. {} {}",
        index.to_string().bold(),
        note.title.cyan(),
        format!("({created})").dimmed()
    );
    println!("   {}", note.id.to_string().dimmed());

    let body = preview(&note.body, 100);
    if !body.is_empty() {
        println!("   {body}");
    }
}
