use colored::Colorize;
use ebbtide_config::EbbtideConfig;
use ebbtide_runner::Runner;
use serde_json::json;

use crate::response::Response;
use crate::utils::{load_registry, open_ledger};

pub fn cmd_status(cfg: &EbbtideConfig) -> Result<Response, Response> {
    let mut store = open_ledger(cfg)?;
    let registry = load_registry(cfg)?;

    let status = {
        let runner = Runner::new(&registry, &mut store);
        runner.status()?
    };
    let locked = store.is_locked()?;

    let mut lines = Vec::new();
    if locked {
        lines.push(
            "database is locked: someone may be running a migration, or one failed; `ebbtide unlock` clears the flag"
                .yellow()
                .to_string(),
        );
    }
    lines.push(format!("applied:   {}", status.summary.applied));
    lines.push(format!("unapplied: {}", status.summary.unapplied));
    if status.summary.skipped > 0 {
        lines.push(
            format!("skipped:   {}", status.summary.skipped)
                .red()
                .to_string(),
        );
    }
    if status.summary.missing > 0 {
        lines.push(
            format!("missing:   {}", status.summary.missing)
                .yellow()
                .to_string(),
        );
    }
    if let Some(last) = &status.last {
        lines.push(format!("last applied: {}", last.name));
    }
    if let Some(next) = &status.summary.next {
        lines.push(format!("next to run:  {next} (`ebbtide up` applies it)"));
    }

    Ok(Response::serializable(
        lines.join("\n"),
        json!({ "locked": locked, "status": status.summary }),
    ))
}
