use anyhow::Result;
use colored::Colorize;

use notevec::NoteId;

use super::CommandContext;

pub fn run(ctx: &CommandContext, id: &str) -> Result<()> {
    let note_id = NoteId::from(id);
    ctx.service.delete_note(ctx.caller(), &note_id)?;

    if ctx.json {
        println!("{}", serde_json::json!({ "deleted": note_id }));
    } else {
        println!("{} Deleted note {}", "✓".green().bold(), note_id.to_string().cyan());
    }

    Ok(())
}
