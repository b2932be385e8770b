pub mod config;
pub mod history;
pub mod profile;
pub mod reminders;
pub mod template;
pub mod workout;

use std::path::Path;

use fittrack_core::WorkoutTemplate;

/// Read a routine from a JSON file and check that it can start a session.
pub(crate) fn read_template_file(path: &Path) -> Result<WorkoutTemplate, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let template: WorkoutTemplate = serde_json::from_str(&json)?;
    template.validate()?;
    Ok(template)
}
