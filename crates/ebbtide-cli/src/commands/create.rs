use chrono::Utc;
use ebbtide_config::EbbtideConfig;
use serde_json::json;

use crate::response::{ErrorCode, Response};

const TEMPLATE: &str = "--BEGIN MIGRATION UP--
CREATE TABLE foo (
  id INTEGER PRIMARY KEY,
  name TEXT NOT NULL
);
--END MIGRATION UP--
--BEGIN MIGRATION DOWN--
DROP TABLE foo;
--END MIGRATION DOWN--
";

pub fn cmd_create(cfg: &EbbtideConfig, name: &str) -> Result<Response, Response> {
    let filename = format!(
        "{}_{}.sql",
        Utc::now().format("%Y%m%d%H%M%S"),
        sanitize_name(name)
    );
    let path = cfg.migrations_dir().join(&filename);

    std::fs::write(&path, TEMPLATE).map_err(|err| {
        Response::error(
            "Unable to create migration file!",
            ErrorCode::UnableCreateMigration,
        )
        .with_details(err)
    })?;

    Ok(Response::serializable(
        format!("created migration: {}", path.display()),
        json!({ "filename": path.display().to_string() }),
    ))
}

/// Lowercase, spaces to underscores, strip everything outside `[a-z-_]`,
/// collapse runs of underscores.
fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.to_lowercase().chars() {
        let ch = if ch == ' ' { '_' } else { ch };
        if ch.is_ascii_lowercase() || ch == '-' || ch == '_' {
            if ch == '_' && out.ends_with('_') {
                continue;
            }
            out.push(ch);
        }
    }
    out
}
