//! Demo command - manage demo mode

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use fitpulse_core::services::DemoService;

use super::get_data_dir;

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Enable demo mode with freshly generated data
    #[command(name = "on")]
    On,
    /// Disable demo mode
    #[command(name = "off")]
    Off {
        /// Also delete the demo database
        #[arg(long)]
        clean: bool,
    },
    /// Show demo mode status
    Status,
}

pub fn run(command: Option<DemoCommands>) -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    let demo_service = DemoService::new(&data_dir);

    match command {
        Some(DemoCommands::On) => {
            let summary = demo_service.enable()?;
            println!("{}", "Demo mode enabled".green());
            println!(
                "Seeded {} workouts, {} meals and {} weigh-ins; {} achievements unlocked.",
                summary.workouts, summary.meals, summary.weight_entries, summary.achievements
            );
            println!("Run 'fp status' to look around.");
            Ok(())
        }
        Some(DemoCommands::Off { clean }) => {
            demo_service.disable(clean)?;
            println!("{}", "Demo mode disabled".yellow());
            Ok(())
        }
        Some(DemoCommands::Status) | None => {
            if demo_service.is_enabled()? {
                println!("Demo mode is {}", "ON".green());
            } else {
                println!("Demo mode is {}", "OFF".yellow());
            }
            Ok(())
        }
    }
}
