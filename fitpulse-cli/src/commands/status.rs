//! Status command - one-screen summary for a user

use anyhow::Result;
use colored::Colorize;
use uuid::Uuid;

use super::{get_context, resolve_user};
use crate::output::{create_table, kg, or_dash};

pub fn run(user: Option<Uuid>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user_id = resolve_user(&ctx, user)?;
    let status = ctx.status_service.get_status(user_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let title = if ctx.config.demo_mode {
        format!("{} (demo)", status.name)
    } else {
        status.name.clone()
    };
    println!("{}", title.bold());
    println!();

    let mut table = create_table();
    table.add_row(vec!["Workouts".to_string(), status.total_workouts.to_string()]);
    table.add_row(vec![
        "Calories burned".to_string(),
        format!("{:.0}", status.calories_burned),
    ]);
    table.add_row(vec!["Meals".to_string(), status.total_meals.to_string()]);
    table.add_row(vec![
        "Current streak".to_string(),
        format!("{} days", status.current_streak),
    ]);
    table.add_row(vec![
        "Achievements".to_string(),
        format!(
            "{} ({} pts)",
            status.achievements_unlocked, status.achievement_points
        ),
    ]);
    table.add_row(vec!["Weight".to_string(), kg(status.current_weight)]);
    table.add_row(vec!["Goal".to_string(), kg(status.goal_weight)]);
    table.add_row(vec!["Last weigh-in".to_string(), or_dash(status.last_weigh_in)]);
    println!("{}", table);
    Ok(())
}
