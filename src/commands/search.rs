//! Semantic search command

use anyhow::Result;
use colored::Colorize;

use super::{print_note_summary, CommandContext};

pub async fn run(ctx: &CommandContext, query: &str) -> Result<()> {
    // Search is a read path: without an identity there is nothing to search.
    let notes = match ctx.caller() {
        Some(owner) => ctx.service.find_relevant_notes(query, owner).await?,
        None => Vec::new(),
    };

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("{} No relevant notes for: {}", "→".dimmed(), query.cyan());
        return Ok(());
    }

    println!(
        "{} {} relevant notes for: {}",
        "→".dimmed(),
        notes.len(),
        query.cyan()
    );
    println!();
    for (i, note) in notes.iter().enumerate() {
        print_note_summary(i + 1, note);
        println!();
    }

    Ok(())
}
