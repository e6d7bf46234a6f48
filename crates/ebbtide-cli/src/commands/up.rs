use ebbtide_config::EbbtideConfig;
use ebbtide_runner::Runner;
use serde_json::json;

use crate::response::Response;
use crate::utils::{load_registry, open_ledger};

pub fn cmd_up(cfg: &EbbtideConfig) -> Result<Response, Response> {
    let mut store = open_ledger(cfg)?;
    let registry = load_registry(cfg)?;
    let mut runner = Runner::new(&registry, &mut store);

    let result = runner.up()?;

    Ok(Response::serializable(
        format!(
            "Migration {} was successfully applied!",
            result.migration.name
        ),
        json!({ "batch": result.batch, "migration": result.migration }),
    ))
}
