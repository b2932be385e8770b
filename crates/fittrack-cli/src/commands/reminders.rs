//! Workout reminder settings. Delivering the reminders is up to the host
//! platform; this only stores when they should fire.

use clap::Subcommand;
use fittrack_core::{Database, Weekday};

#[derive(Subcommand)]
pub enum RemindersAction {
    /// Show reminder settings
    Show,
    /// Update reminder settings
    Set {
        /// Turn reminders on
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        /// Turn reminders off
        #[arg(long)]
        disable: bool,
        /// Days to remind on (e.g. mon,wed,fri)
        #[arg(long, value_delimiter = ',')]
        days: Option<Vec<Weekday>>,
        /// Time of day, HH:MM
        #[arg(long)]
        time: Option<String>,
    },
}

pub fn run(action: RemindersAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        RemindersAction::Show => {
            let settings = db.load_notification_settings()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        RemindersAction::Set {
            enable,
            disable,
            days,
            time,
        } => {
            let mut settings = db.load_notification_settings()?;
            if enable {
                settings.enabled = true;
            }
            if disable {
                settings.enabled = false;
            }
            if let Some(days) = days {
                settings.days = days.into_iter().collect();
            }
            if let Some(time) = time {
                settings.time = time;
            }
            db.save_notification_settings(&settings)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}
