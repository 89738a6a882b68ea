//! Suggest command - workout and nutrition hints, most urgent first

use anyhow::Result;
use colored::Colorize;
use fitpulse_core::presentation::priority_label;
use fitpulse_core::services::{Priority, SuggestionCategory};
use uuid::Uuid;

use super::{get_context, resolve_user};

pub fn run(user: Option<Uuid>, category: Option<SuggestionCategory>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user_id = resolve_user(&ctx, user)?;
    ctx.profile_service.get_user(user_id)?;
    let suggestions = ctx.suggestion_service.suggestions(user_id, category);

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    if suggestions.is_empty() {
        println!("Nothing to suggest right now. Keep it up!");
        return Ok(());
    }

    for s in suggestions {
        let label = match s.priority {
            Priority::High => priority_label(s.priority).red().bold(),
            Priority::Medium => priority_label(s.priority).yellow().bold(),
            Priority::Low => priority_label(s.priority).dimmed(),
        };
        println!("[{}] {}", label, s.title.bold());
        println!("    {}", s.message);
    }
    Ok(())
}
