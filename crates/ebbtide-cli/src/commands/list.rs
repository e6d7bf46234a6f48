use chrono::SecondsFormat;
use colored::Colorize;
use ebbtide_config::EbbtideConfig;
use ebbtide_core::{MigrationStatus, MigrationView};
use ebbtide_runner::Runner;
use serde_json::json;

use crate::response::Response;
use crate::utils::{load_registry, open_ledger};

pub fn cmd_list(cfg: &EbbtideConfig) -> Result<Response, Response> {
    let mut store = open_ledger(cfg)?;
    let registry = load_registry(cfg)?;
    let runner = Runner::new(&registry, &mut store);
    let status = runner.status()?;

    let mut lines = vec![format!(
        "{:>5} {:<48} {:>5} {:<20} {:<20}",
        "ID", "Migration", "Batch", "Time of Run", "Note"
    )];

    let mut saw_skipped = false;
    let mut saw_missing = false;

    for item in &status.items {
        let line = match (&item.migration, item.status) {
            (MigrationView::Applied { id, name, batch, time }, MigrationStatus::Missing) => {
                saw_missing = true;
                format!(
                    "{:>5} {:<48} {:>5} {:<20} {:<20}",
                    id,
                    name,
                    batch,
                    time.to_rfc3339_opts(SecondsFormat::Secs, true),
                    "Missing File!"
                )
                .yellow()
                .to_string()
            }
            (MigrationView::Applied { id, name, batch, time }, _) => format!(
                "{:>5} {:<48} {:>5} {:<20} {:<20}",
                id,
                name,
                batch,
                time.to_rfc3339_opts(SecondsFormat::Secs, true),
                "Applied"
            )
            .green()
            .to_string(),
            (MigrationView::Unapplied { name }, MigrationStatus::Skipped) => {
                saw_skipped = true;
                format!(
                    "{:>5} {:<48} {:>5} {:<20} {:<20}",
                    "", name, "", "", "Migration Skipped!"
                )
                .red()
                .to_string()
            }
            (MigrationView::Unapplied { name }, _) => format!(
                "{:>5} {:<48} {:>5} {:<20} {:<20}",
                "", name, "", "", "Ready to Run"
            )
            .cyan()
            .to_string(),
        };
        lines.push(line);
    }

    if saw_skipped || saw_missing {
        lines.push(String::new());
    }
    if saw_skipped {
        lines.push(
            "* A skipped migration was encountered. If editing locally you may need to rename the file to the current time."
                .red()
                .to_string(),
        );
    }
    if saw_missing {
        lines.push(
            "* A missing migration was encountered. You might need to pull changes from repo."
                .yellow()
                .to_string(),
        );
    }

    Ok(Response::serializable(lines.join("\n"), json!(status.items)))
}
