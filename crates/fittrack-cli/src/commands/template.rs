//! Workout template commands for CLI.

use std::path::PathBuf;

use clap::Subcommand;
use fittrack_core::{Database, TemplateStore};

use super::read_template_file;

#[derive(Subcommand)]
pub enum TemplateAction {
    /// List stored templates
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a template from a JSON file (replaces one with the same name)
    Import {
        /// Path to the template JSON file
        file: PathBuf,
    },
}

pub fn run(action: TemplateAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TemplateAction::List { json } => {
            let templates = db.templates()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&templates)?);
            } else if templates.is_empty() {
                println!("No templates found. Use 'template import' to add one.");
            } else {
                for template in templates {
                    println!(
                        "{} ({} exercises x {} sets)",
                        template.name,
                        template.exercises.len(),
                        template.set_count
                    );
                }
            }
        }
        TemplateAction::Import { file } => {
            let template = read_template_file(&file)?;
            db.save_template(&template)?;
            println!("Template imported: {}", template.name);
        }
    }
    Ok(())
}
