//! Predict command - projected weight on a target date

use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use fitpulse_core::services::{missing_inputs, MissingInput};
use fitpulse_core::Error;
use uuid::Uuid;

use super::{get_context, resolve_user};
use crate::output::create_table;

/// Command that fills in a missing prediction input
fn fix_for(input: MissingInput) -> &'static str {
    match input {
        MissingInput::CurrentWeight => "fp weight add <KG>",
        MissingInput::GoalWeight => "fp user update --goal-weight <KG>",
        MissingInput::Height => "fp user update --height <CM>",
        MissingInput::DateOfBirth => "fp user update --dob <YYYY-MM-DD>",
    }
}

pub fn run(user: Option<Uuid>, date: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user_id = resolve_user(&ctx, user)?;

    let profile = ctx.profile_service.get_user(user_id)?;
    let missing = missing_inputs(&profile, Local::now().date_naive());
    if !missing.is_empty() {
        let steps: Vec<String> = missing
            .iter()
            .map(|m| format!("  {}: {}", m.label(), fix_for(*m)))
            .collect();
        return Err(Error::validation(format!(
            "Prediction needs more profile data:\n{}",
            steps.join("\n")
        ))
        .into());
    }

    let p = ctx.prediction_service.predict(user_id, date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&p)?);
        return Ok(());
    }

    println!(
        "By {} ({} days): {}",
        p.target_date,
        p.days_remaining,
        format!("{:.1} kg", p.predicted_weight).bold()
    );
    if p.on_track {
        println!("{}", format!("On track for {:.1} kg", p.goal_weight).green());
    } else {
        println!(
            "{}",
            format!(
                "Off track: {:.1} kg from goal of {:.1} kg",
                (p.predicted_weight - p.goal_weight).abs(),
                p.goal_weight
            )
            .yellow()
        );
    }
    println!();

    let mut table = create_table();
    table.add_row(vec!["Current weight".to_string(), format!("{:.1} kg", p.current_weight)]);
    table.add_row(vec!["BMR".to_string(), format!("{:.0} kcal", p.bmr)]);
    table.add_row(vec!["TDEE".to_string(), format!("{:.0} kcal", p.tdee)]);
    table.add_row(vec![
        "Average intake".to_string(),
        format!("{:.0} kcal", p.avg_daily_calories),
    ]);
    table.add_row(vec![
        "Daily deficit".to_string(),
        format!("{:+.0} kcal", p.daily_deficit),
    ]);
    table.add_row(vec![
        "Weekly change".to_string(),
        format!("{:+.2} kg", p.weekly_weight_change),
    ]);
    table.add_row(vec![
        "Total change".to_string(),
        format!("{:+.1} kg", p.predicted_weight_change),
    ]);
    println!("{}", table);
    Ok(())
}
