use colored::Colorize;
use serde_json::json;

use crate::response::Response;

pub fn cmd_version() -> Result<Response, Response> {
    let version = env!("CARGO_PKG_VERSION");
    let build_time = env!("EBBTIDE_BUILD_TIME");

    let message = format!(
        "{}\n{}",
        format!("ebbtide version: {version}").bright_green(),
        format!("build time:  {build_time}").white(),
    );

    Ok(Response::serializable(
        message,
        json!({ "version": version, "build_time": build_time }),
    ))
}
