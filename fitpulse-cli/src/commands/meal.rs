//! Meal command - log and review what was eaten

use anyhow::{anyhow, Result};
use clap::Subcommand;
use colored::Colorize;
use fitpulse_core::presentation::meal_type_label;
use fitpulse_core::{FoodItem, MacroTotals, Meal, MealType};
use uuid::Uuid;

use super::{get_context, parse_date, parse_when, resolve_user, with_achievement_worker};
use crate::output::{create_table, print_unlocks, success};

#[derive(Subcommand)]
pub enum MealCommands {
    /// Log a meal
    Add {
        /// breakfast, lunch, dinner or snack
        #[arg(long = "type")]
        meal_type: MealType,
        /// Food as "NAME,AMOUNT,KCAL,PROTEIN,CARBS,FAT", repeatable
        #[arg(long = "food", required = true)]
        foods: Vec<String>,
        /// When it was eaten (YYYY-MM-DD or "YYYY-MM-DD HH:MM"), default now
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recent meals, or every meal on one day
    List {
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Show one day (YYYY-MM-DD) with its totals
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meal
    Delete {
        id: Uuid,
    },
}

/// Parse `oats,80 g,300,10,54,5` into a food item
///
/// The name is everything before the last five fields, so it may contain commas.
pub fn parse_food(input: &str) -> Result<FoodItem> {
    let parts: Vec<&str> = input.rsplitn(6, ',').collect();
    if parts.len() != 6 {
        return Err(anyhow!(
            "Invalid food '{}'. Use NAME,AMOUNT,KCAL,PROTEIN,CARBS,FAT",
            input
        ));
    }

    let number = |field: &str, label: &str| -> Result<f64> {
        field
            .trim()
            .parse::<f64>()
            .map_err(|_| anyhow!("Invalid {} '{}' in '{}'", label, field.trim(), input))
    };

    // rsplitn yields fields right to left
    Ok(FoodItem {
        name: parts[5].trim().to_string(),
        amount: parts[4].trim().to_string(),
        calories: number(parts[3], "calories")?,
        protein: number(parts[2], "protein")?,
        carbs: number(parts[1], "carbs")?,
        fat: number(parts[0], "fat")?,
    })
}

pub fn run(command: MealCommands, user: Option<Uuid>) -> Result<()> {
    let ctx = get_context()?;

    match command {
        MealCommands::Add {
            meal_type,
            foods,
            date,
            json,
        } => {
            let user_id = resolve_user(&ctx, user)?;
            let items = foods
                .iter()
                .map(|f| parse_food(f))
                .collect::<Result<Vec<_>>>()?;
            let meal = Meal::new(user_id, parse_when(date.as_deref())?, meal_type, items);

            let (meal, unlocks) =
                with_achievement_worker(&ctx, |ctx| ctx.activity_service.log_meal(meal))?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "meal": meal,
                        "unlocked": unlocks,
                    }))?
                );
                return Ok(());
            }

            success(&format!(
                "Logged {} ({:.0} kcal)",
                meal_type_label(meal.meal_type),
                meal.totals.calories
            ));
            println!("  ID: {}", meal.id);
            print_unlocks(&unlocks);
        }
        MealCommands::List { limit, date, json } => {
            let user_id = resolve_user(&ctx, user)?;

            if let Some(day) = date {
                let day = parse_date(&day)?;
                let (meals, totals) = ctx.activity_service.meals_on(user_id, day)?;
                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "date": day,
                            "meals": meals,
                            "totals": totals,
                        }))?
                    );
                    return Ok(());
                }
                if meals.is_empty() {
                    println!("No meals logged on {}.", day);
                    return Ok(());
                }
                println!("{}", format!("Meals on {}", day).bold());
                print_meals(&meals);
                print_totals(&totals, ctx.profile_service.get_user(user_id)?.daily_calorie_goal);
                return Ok(());
            }

            let meals = ctx.activity_service.list_meals(user_id, limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&meals)?);
                return Ok(());
            }
            if meals.is_empty() {
                println!("No meals yet. Log one with 'fp meal add --type lunch --food ...'.");
                return Ok(());
            }
            print_meals(&meals);
        }
        MealCommands::Delete { id } => {
            ctx.activity_service.delete_meal(id)?;
            success("Meal deleted");
        }
    }

    Ok(())
}

fn print_meals(meals: &[Meal]) {
    let mut table = create_table();
    table.set_header(vec!["Date", "Meal", "Foods", "kcal", "P", "C", "F", "ID"]);
    for meal in meals {
        let foods = meal
            .food_items
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            meal.date.format("%Y-%m-%d %H:%M").to_string(),
            meal_type_label(meal.meal_type).to_string(),
            foods,
            format!("{:.0}", meal.totals.calories),
            format!("{:.0}", meal.totals.protein),
            format!("{:.0}", meal.totals.carbs),
            format!("{:.0}", meal.totals.fat),
            meal.id.to_string(),
        ]);
    }
    println!("{}", table);
}

fn print_totals(totals: &MacroTotals, goal: Option<f64>) {
    println!(
        "Total: {:.0} kcal, {:.0} g protein, {:.0} g carbs, {:.0} g fat",
        totals.calories, totals.protein, totals.carbs, totals.fat
    );
    if let Some(goal) = goal {
        let remaining = goal - totals.calories;
        if remaining >= 0.0 {
            println!("  {:.0} kcal left of {:.0}", remaining, goal);
        } else {
            println!("  {}", format!("{:.0} kcal over {:.0}", -remaining, goal).red());
        }
    }
}
