use anyhow::Result;
use colored::Colorize;

use notevec::Config;

use super::CommandContext;

pub fn run(ctx: &CommandContext, config: &Config) -> Result<()> {
    let stats = ctx.service.stats(ctx.caller())?;
    let stored_model = ctx.service.store().embedding_model()?;
    let file_size = std::fs::metadata(&config.db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    if ctx.json {
        println!(
            "{}",
            serde_json::json!({
                "db_path": config.db_path.display().to_string(),
                "note_count": stats.note_count,
                "embedding_count": stats.embedding_count,
                "file_size_bytes": file_size,
                "model": ctx.service.model_name(),
                "stored_model": stored_model,
                "dimension": ctx.service.store().embedding_dimension()?,
                "relevance_threshold": config.retrieval.relevance_threshold,
                "candidate_limit": config.retrieval.candidate_limit,
            })
        );
        return Ok(());
    }

    match ctx.caller() {
        Some(user) => println!("{} {}", "Store Status for".bold(), user.to_string().cyan()),
        None => println!("{} (no user: counts are empty)", "Store Status".bold()),
    }
    println!();
    println!("  {} {} notes", "→".dimmed(), stats.note_count.to_string().cyan());
    println!(
        "  {} {} chunk embeddings",
        "→".dimmed(),
        stats.embedding_count.to_string().cyan()
    );
    println!("  {} Size: {:.2} KB", "→".dimmed(), file_size as f64 / 1024.0);
    println!("  {} Model: {}", "→".dimmed(), ctx.service.model_name());
    if let Some(dim) = ctx.service.store().embedding_dimension()? {
        println!("  {} Dimension: {}", "→".dimmed(), dim);
    }
    println!(
        "  {} Threshold: > {} over top {} candidates",
        "→".dimmed(),
        config.retrieval.relevance_threshold,
        config.retrieval.candidate_limit
    );
    println!("  {} Database: {}", "→".dimmed(), config.db_path.display());

    Ok(())
}
