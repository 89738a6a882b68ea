//! Streak command - consecutive workout days

use anyhow::Result;
use colored::Colorize;
use uuid::Uuid;

use super::{get_context, resolve_user};

pub fn run(user: Option<Uuid>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user_id = resolve_user(&ctx, user)?;
    // Surfaces NotFound; the streak itself never fails
    ctx.profile_service.get_user(user_id)?;
    let streak = ctx.streak_service.current_streak(user_id);

    if json {
        println!("{}", serde_json::json!({ "user_id": user_id, "streak": streak }));
        return Ok(());
    }

    match streak {
        0 => println!("No active streak. Log a workout today to start one."),
        1 => println!("🔥 1 day streak. Come back tomorrow to keep it going."),
        n => println!("🔥 {} day streak", n.to_string().bold()),
    }
    Ok(())
}
