use anyhow::Result;
use colored::Colorize;

use notevec::NoteId;

use super::CommandContext;

pub fn run(ctx: &CommandContext, id: &str) -> Result<()> {
    let note = ctx.service.get_note(ctx.caller(), &NoteId::from(id))?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&note)?);
        return Ok(());
    }

    println!("{}", note.title.bold().cyan());
    println!("{}", note.id.to_string().dimmed());
    println!();
    println!("{}", note.body);

    Ok(())
}
