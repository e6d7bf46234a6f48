use colored::Colorize;
use ebbtide_config::EbbtideConfig;
use ebbtide_runner::{BatchResult, Runner};
use serde_json::json;

use crate::response::Response;
use crate::utils::{load_registry, open_ledger};

pub fn cmd_upto(cfg: &EbbtideConfig, target: &str) -> Result<Response, Response> {
    let mut store = open_ledger(cfg)?;
    let registry = load_registry(cfg)?;
    let mut runner = Runner::new(&registry, &mut store);

    let result = runner.upto(target)?;
    Ok(batch_response(result))
}

/// Shared by `upto` and `all`: one success line per applied migration,
/// payload carrying the batch number and the new ledger entries.
pub fn batch_response(result: BatchResult) -> Response {
    let mut lines = vec![
        format!("Running migrations for batch {}...", result.batch)
            .bright_white()
            .to_string(),
    ];
    for entry in &result.migrations {
        lines.push(
            format!("Migration {} was successfully applied!", entry.name)
                .bright_green()
                .to_string(),
        );
    }

    Response::serializable(
        lines.join("\n"),
        json!({ "batch": result.batch, "migrations": result.migrations }),
    )
}
