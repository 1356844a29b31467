use anyhow::Result;
use colored::Colorize;

use super::CommandContext;

pub async fn run(ctx: &CommandContext, title: &str, body: &str) -> Result<()> {
    let saved = ctx.service.create_note(ctx.caller(), title, body).await?;
    let id = saved.note.id;
    let chunks = saved.embedding_ids.len();

    if ctx.json {
        println!(
            "{}",
            serde_json::json!({
                "id": id,
                "chunks": chunks,
                "model": ctx.service.model_name(),
            })
        );
    } else {
        println!(
            "{} Created note {} ({} chunks embedded)",
            "✓".green().bold(),
            id.to_string().cyan(),
            chunks
        );
    }

    Ok(())
}
