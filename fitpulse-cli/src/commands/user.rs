//! User command - create, inspect and select profiles

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use colored::Colorize;
use dialoguer::Input;
use fitpulse_core::services::ProfileUpdate;
use fitpulse_core::{ActivityLevel, Gender, User};
use uuid::Uuid;

use super::{get_context, resolve_user};
use crate::output::{create_table, kg, or_dash, success, warning};

/// Profile fields shared by `create` and `update`
#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    /// Height in centimetres
    #[arg(long)]
    height: Option<f64>,
    /// Goal weight in kg
    #[arg(long)]
    goal_weight: Option<f64>,
    /// sedentary, lightly_active, moderately_active, very_active, extremely_active
    #[arg(long)]
    activity: Option<ActivityLevel>,
    /// Daily calorie goal in kcal
    #[arg(long)]
    calorie_goal: Option<f64>,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    dob: Option<NaiveDate>,
    /// male, female or other
    #[arg(long)]
    gender: Option<Gender>,
}

impl ProfileArgs {
    fn into_update(self, name: Option<String>) -> ProfileUpdate {
        ProfileUpdate {
            name,
            height_cm: self.height,
            goal_weight: self.goal_weight,
            activity_level: self.activity,
            daily_calorie_goal: self.calorie_goal,
            date_of_birth: self.dob,
            gender: self.gender,
        }
    }
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user and make it the active one
    Create {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        profile: ProfileArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a user's profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update profile fields
    Update {
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        profile: ProfileArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Make a user the default for later commands
    Use {
        id: Uuid,
    },
    /// List all users
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: UserCommands, user: Option<Uuid>) -> Result<()> {
    match command {
        UserCommands::Create {
            email,
            name,
            profile,
            json,
        } => run_create(email, name, profile, json),
        UserCommands::Show { json } => {
            let ctx = get_context()?;
            let user_id = resolve_user(&ctx, user)?;
            let user = ctx.profile_service.get_user(user_id)?;
            print_user(&user, json)
        }
        UserCommands::Update {
            name,
            profile,
            json,
        } => {
            let ctx = get_context()?;
            let user_id = resolve_user(&ctx, user)?;
            let user = ctx
                .profile_service
                .update_profile(user_id, profile.into_update(name))?;
            if !json {
                success("Profile updated");
            }
            print_user(&user, json)
        }
        UserCommands::Use { id } => {
            let ctx = get_context()?;
            // Fails with NotFound for unknown ids
            let user = ctx.profile_service.get_user(id)?;
            let mut config = ctx.config.clone();
            config.active_user = Some(user.id);
            config.save(&ctx.data_dir)?;
            success(&format!("Active user is now {} ({})", user.name, user.id));
            if ctx.config.demo_mode {
                warning("Demo mode is on; commands use the demo user until 'fp demo off'.");
            }
            Ok(())
        }
        UserCommands::List { json } => {
            let ctx = get_context()?;
            let users = ctx.profile_service.list_users()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
                return Ok(());
            }
            if users.is_empty() {
                println!("No users yet. Create one with 'fp user create'.");
                return Ok(());
            }
            let active = ctx.active_user();
            let mut table = create_table();
            table.set_header(vec!["", "ID", "Name", "Email", "Weight", "Goal"]);
            for u in users {
                let marker = if Some(u.id) == active { "*" } else { "" };
                table.add_row(vec![
                    marker.to_string(),
                    u.id.to_string(),
                    u.name,
                    u.email,
                    kg(u.current_weight),
                    kg(u.goal_weight),
                ]);
            }
            println!("{}", table);
            Ok(())
        }
    }
}

fn run_create(
    email: Option<String>,
    name: Option<String>,
    profile: ProfileArgs,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;

    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };
    let name = match name {
        Some(n) => n,
        None => Input::new().with_prompt("Name").interact_text()?,
    };

    let user = ctx
        .profile_service
        .create_user(&email, &name, profile.into_update(None))?;

    let mut config = ctx.config.clone();
    config.active_user = Some(user.id);
    config.save(&ctx.data_dir)?;

    if !json {
        success(&format!("Created user {}", user.name));
    }
    print_user(&user, json)
}

fn print_user(user: &User, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(user)?);
        return Ok(());
    }

    println!("{}", user.name.bold());
    let mut table = create_table();
    table.add_row(vec!["ID".to_string(), user.id.to_string()]);
    table.add_row(vec!["Email".to_string(), user.email.clone()]);
    table.add_row(vec![
        "Height".to_string(),
        user.height_cm
            .map(|h| format!("{:.0} cm", h))
            .unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec!["Current weight".to_string(), kg(user.current_weight)]);
    table.add_row(vec!["Starting weight".to_string(), kg(user.starting_weight)]);
    table.add_row(vec!["Goal weight".to_string(), kg(user.goal_weight)]);
    table.add_row(vec!["Activity".to_string(), or_dash(user.activity_level)]);
    table.add_row(vec![
        "Calorie goal".to_string(),
        user.daily_calorie_goal
            .map(|c| format!("{:.0} kcal", c))
            .unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec!["Date of birth".to_string(), or_dash(user.date_of_birth)]);
    table.add_row(vec!["Gender".to_string(), or_dash(user.gender)]);
    println!("{}", table);
    Ok(())
}
