//! Achievements command - unlocked badges

use anyhow::Result;
use colored::Colorize;
use fitpulse_core::presentation::badge;
use fitpulse_core::services::Unlock;
use fitpulse_core::AchievementKind;
use uuid::Uuid;

use super::{get_context, resolve_user};
use crate::output::{create_table, info, print_unlocks};

pub fn run(user: Option<Uuid>, check: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user_id = resolve_user(&ctx, user)?;
    ctx.profile_service.get_user(user_id)?;

    let newly_unlocked: Vec<AchievementKind> = if check {
        ctx.achievement_service.check_achievements(user_id)
    } else {
        Vec::new()
    };
    let unlocked = ctx.achievement_service.list_achievements(user_id)?;
    let points = ctx.achievement_service.total_points(user_id)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "achievements": unlocked,
                "total_points": points,
                "newly_unlocked": newly_unlocked,
            }))?
        );
        return Ok(());
    }

    if check {
        if newly_unlocked.is_empty() {
            info("No new achievements.");
        } else {
            let unlocks: Vec<Unlock> = newly_unlocked
                .iter()
                .map(|&kind| Unlock { user_id, kind })
                .collect();
            print_unlocks(&unlocks);
        }
        println!();
    }

    let mut table = create_table();
    table.set_header(vec!["", "Badge", "Description", "Points", "Unlocked"]);
    for kind in AchievementKind::ALL {
        let b = badge(kind);
        let earned = unlocked.iter().find(|a| a.kind == kind);
        let (icon, title, when) = match earned {
            Some(a) => (
                b.icon.to_string(),
                b.title.bold().to_string(),
                a.unlocked_at.format("%Y-%m-%d").to_string(),
            ),
            None => ("🔒".to_string(), b.title.dimmed().to_string(), String::new()),
        };
        table.add_row(vec![
            icon,
            title,
            b.description.to_string(),
            kind.points().to_string(),
            when,
        ]);
    }
    println!("{}", table);
    println!(
        "{} of {} unlocked, {} points",
        unlocked.len(),
        AchievementKind::ALL.len(),
        points.to_string().bold()
    );
    Ok(())
}
