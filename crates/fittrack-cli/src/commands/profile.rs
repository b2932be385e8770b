//! Body measurement commands.

use clap::Subcommand;
use fittrack_core::{Database, UserProfile};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the stored profile with BMI
    Show,
    /// Store height and weight
    Set {
        /// Height in centimeters
        #[arg(long)]
        height: f64,
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,
    },
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ProfileAction::Show => match db.load_profile()? {
            Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
            None => println!("No profile found. Use 'profile set' to create one."),
        },
        ProfileAction::Set { height, weight } => {
            let profile = UserProfile::new(height, weight)?;
            db.save_profile(&profile)?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }
    Ok(())
}
