use ebbtide_config::EbbtideConfig;
use ebbtide_runner::Runner;

use crate::response::Response;
use crate::utils::{load_registry, open_ledger};

pub fn cmd_down(cfg: &EbbtideConfig) -> Result<Response, Response> {
    let mut store = open_ledger(cfg)?;
    let registry = load_registry(cfg)?;
    let mut runner = Runner::new(&registry, &mut store);

    let entry = runner.down()?;

    Ok(Response::success(format!(
        "Migration down {} was successfully applied!",
        entry.name
    )))
}
