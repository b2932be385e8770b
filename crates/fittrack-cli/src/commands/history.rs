use chrono::Local;
use clap::Subcommand;
use fittrack_core::{Database, HistoryStats, WorkoutStore};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List past workouts, newest first
    List {
        /// Maximum number of workouts to show
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show aggregate statistics
    Stats,
    /// Delete a workout by id
    Delete {
        /// Workout id as shown by `history list`
        id: String,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HistoryAction::List { limit } => {
            let records = match limit {
                Some(limit) => db.recent_workouts(limit)?,
                None => {
                    let mut all = db.workouts()?;
                    all.reverse();
                    all
                }
            };
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        HistoryAction::Stats => {
            let records = db.workouts()?;
            let stats = HistoryStats::from_records(&records, Local::now().date_naive(), &Local);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        HistoryAction::Delete { id } => {
            if !db.delete_workout(&id)? {
                return Err(format!("no workout with id '{id}'").into());
            }
            println!("Workout deleted: {id}");
        }
    }
    Ok(())
}
