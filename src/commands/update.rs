use anyhow::Result;
use colored::Colorize;

use notevec::NoteId;

use super::CommandContext;

pub async fn run(ctx: &CommandContext, id: &str, title: &str, body: &str) -> Result<()> {
    let note_id = NoteId::from(id);
    let saved = ctx
        .service
        .update_note(ctx.caller(), &note_id, title, body)
        .await?;
    let note = saved.note;
    let chunks = saved.embedding_ids.len();

    if ctx.json {
        println!(
            "{}",
            serde_json::json!({
                "note": note,
                "chunks": chunks,
            })
        );
    } else {
        println!(
            "{} Updated {} ({} chunks re-embedded)",
            "✓".green().bold(),
            note.title.cyan(),
            chunks
        );
    }

    Ok(())
}
