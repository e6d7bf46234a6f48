use ebbtide_config::EbbtideConfig;
use ebbtide_runner::Runner;

use crate::commands::upto::batch_response;
use crate::response::Response;
use crate::utils::{load_registry, open_ledger};

pub fn cmd_all(cfg: &EbbtideConfig) -> Result<Response, Response> {
    let mut store = open_ledger(cfg)?;
    let registry = load_registry(cfg)?;
    let mut runner = Runner::new(&registry, &mut store);

    let result = runner.all()?;
    Ok(batch_response(result))
}
