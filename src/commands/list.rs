use anyhow::Result;
use colored::Colorize;

use super::{print_note_summary, CommandContext};

pub fn run(ctx: &CommandContext) -> Result<()> {
    let notes = ctx.service.list_notes(ctx.caller())?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }

    if ctx.caller().is_none() {
        println!(
            "{} Not signed in; pass {} to see your notes",
            "!".yellow(),
            "--user".cyan()
        );
        return Ok(());
    }
    if notes.is_empty() {
        println!("{} No notes yet", "→".dimmed());
        return Ok(());
    }

    println!("{} {} notes", "→".dimmed(), notes.len());
    println!();
    for (i, note) in notes.iter().enumerate() {
        print_note_summary(i + 1, note);
        println!();
    }

    Ok(())
}
