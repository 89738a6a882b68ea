//! Health command - 0-100 score over the last 30 days

use anyhow::Result;
use colored::{ColoredString, Colorize};
use fitpulse_core::services::Grade;
use uuid::Uuid;

use super::{get_context, resolve_user};
use crate::output::create_table;

fn colored_grade(grade: Grade) -> ColoredString {
    let text = grade.as_str().bold();
    match grade {
        Grade::APlus | Grade::A | Grade::BPlus => text.green(),
        Grade::B | Grade::CPlus | Grade::C => text.yellow(),
        Grade::D | Grade::F => text.red(),
    }
}

pub fn run(user: Option<Uuid>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user_id = resolve_user(&ctx, user)?;
    let score = ctx.health_service.calculate(user_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&score)?);
        return Ok(());
    }

    println!(
        "Health score: {} / 100  grade {}",
        format!("{:.0}", score.total_score).bold(),
        colored_grade(score.grade)
    );
    println!("{} to {}", score.window_start, score.window_end);
    println!();

    let mut table = create_table();
    table.set_header(vec!["Factor", "Score", "Value", "Target"]);
    for factor in score.factors.values() {
        table.add_row(vec![
            factor.label.clone(),
            format!("{:.1} / {:.0}", factor.score, factor.max_score),
            format!("{:.1}", factor.value),
            format!("{:.1}", factor.target),
        ]);
    }
    println!("{}", table);
    Ok(())
}
