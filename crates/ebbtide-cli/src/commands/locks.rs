use ebbtide_config::EbbtideConfig;

use crate::response::Response;
use crate::utils::open_ledger;

pub fn cmd_lock(cfg: &EbbtideConfig) -> Result<Response, Response> {
    let mut store = open_ledger(cfg)?;
    let was_locked = store.set_locked(true)?;
    Ok(Response::success(if was_locked {
        "already locked!"
    } else {
        "successfully locked."
    }))
}

pub fn cmd_unlock(cfg: &EbbtideConfig) -> Result<Response, Response> {
    let mut store = open_ledger(cfg)?;
    let was_locked = store.set_locked(false)?;
    Ok(Response::success(if was_locked {
        "successfully unlocked."
    } else {
        "already unlocked!"
    }))
}
