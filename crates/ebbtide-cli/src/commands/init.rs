use ebbtide_config::EbbtideConfig;

use crate::response::Response;
use crate::utils::open_store;

pub fn cmd_init(cfg: &EbbtideConfig) -> Result<Response, Response> {
    let store = open_store(cfg)?;
    store.ensure_initialized()?;
    Ok(Response::success("successfully initialized ebbtide."))
}
