use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use ebbtide_config::ConfigOverrides;

mod commands;
mod response;
mod utils;

use commands::{
    cmd_all, cmd_create, cmd_down, cmd_init, cmd_list, cmd_lock, cmd_status, cmd_unlock, cmd_up,
    cmd_upto, cmd_version,
};
use response::{ErrorCode, Response};

/// ebbtide command-line interface.
#[derive(Parser, Debug)]
#[command(name = "ebbtide", author, version, about)]
struct Cli {
    /// Emit machine-readable JSON instead of human output.
    #[arg(long, global = true)]
    json: bool,

    /// Path to the JSON config file (default: ebbtide.json).
    #[arg(long, global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Database connection string, e.g. sqlite://localhost/app.db.
    #[arg(long, global = true, value_name = "URL")]
    connection: Option<String>,

    /// Directory holding the .sql migration files.
    #[arg(long, global = true, value_name = "DIR")]
    migrations: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the ledger and lock tables.
    Init,
    /// Show reconciled migration state and the lock flag.
    Status,
    /// List every migration with its classification.
    #[command(alias = "ls")]
    List,
    /// Manually set the advisory lock.
    Lock,
    /// Manually clear the advisory lock.
    Unlock,
    /// Apply the next pending migration.
    Up,
    /// Revert the most recently applied migration.
    Down,
    /// Apply pending migrations up to and including the named one.
    Upto { name: String },
    /// Apply every pending migration.
    All,
    /// Scaffold a new migration file.
    Create { name: String },
    /// Print version and build information.
    Version,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => handle_parse_error(err),
    };

    let json = cli.json;
    let response = dispatch(cli).unwrap_or_else(|response| response);
    std::process::exit(response.render(json));
}

fn dispatch(cli: Cli) -> Result<Response, Response> {
    let Some(command) = cli.command else {
        return Err(Response::error(
            "usage: ebbtide <command>",
            ErrorCode::CommandUsage,
        ));
    };

    // version needs no configuration and must work before any config exists
    if matches!(command, Commands::Version) {
        return cmd_version();
    }

    let overrides = ConfigOverrides {
        connection: cli.connection,
        migrations: cli.migrations,
    };
    let cfg = overrides.resolve(cli.file.as_deref())?;

    match command {
        Commands::Init => cmd_init(&cfg),
        Commands::Status => cmd_status(&cfg),
        Commands::List => cmd_list(&cfg),
        Commands::Lock => cmd_lock(&cfg),
        Commands::Unlock => cmd_unlock(&cfg),
        Commands::Up => cmd_up(&cfg),
        Commands::Down => cmd_down(&cfg),
        Commands::Upto { name } => cmd_upto(&cfg, &name),
        Commands::All => cmd_all(&cfg),
        Commands::Create { name } => cmd_create(&cfg, &name),
        Commands::Version => cmd_version(),
    }
}

fn handle_parse_error(err: clap::Error) -> ! {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            std::process::exit(0);
        }
        _ => {
            // the response must still honor --json even though parsing failed
            let json = std::env::args().any(|arg| arg == "--json");
            let response =
                Response::error(err.to_string().trim_end(), ErrorCode::CommandUsage);
            std::process::exit(response.render(json));
        }
    }
}
