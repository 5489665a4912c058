use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;
mod storage;

#[derive(Parser)]
#[command(name = "bbstats", about = "Reports from the BlackBerry World vendor portal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and save the session for later commands
    Login {
        /// Vendor account (defaults to default_username in config.toml)
        #[arg(short, long)]
        username: Option<String>,
        /// Account password
        #[arg(short, long, env = "BBSTATS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the portal session and forget it locally
    Logout,

    /// List your apps (JSON)
    Apps,

    /// List finished reports (JSON)
    Reports,

    /// Ask the portal to generate a report; prints the expected file name
    Schedule {
        /// App id, app link name, or "all"
        app: String,
        /// downloads, downloads-summary, purchases, subscriptions, reviews (or 1-5)
        report_type: String,
        /// Start date: YYYY-MM-DD or a day offset from today
        #[arg(long, default_value = "-14", allow_hyphen_values = true)]
        start: String,
        /// End date: YYYY-MM-DD or a day offset from today
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        end: String,
    },

    /// Guess whether a scheduled report is ready (JSON)
    State {
        /// App id, app link name, or "all"
        app: String,
        /// downloads, downloads-summary, purchases, subscriptions, reviews (or 1-5)
        report_type: String,
        #[arg(long, default_value = "-14", allow_hyphen_values = true)]
        start: String,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        end: String,
    },

    /// Download a finished report and extract its CSV
    Download {
        /// Report file name as shown by `reports`
        file_name: String,
        /// Where to put the CSV (default: ./<report>.csv unless --rows)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the rows as JSON
        #[arg(long)]
        rows: bool,
    },

    /// Delete a finished report from the portal
    Delete {
        /// Report file name as shown by `reports`
        file_name: String,
    },

    /// Delete every report on the portal
    DeleteAll,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Login { username, password } => {
            cli::commands::cmd_login(username.as_deref(), password)
        }
        Commands::Logout => cli::commands::cmd_logout(),
        Commands::Apps => cli::commands::cmd_apps(),
        Commands::Reports => cli::commands::cmd_reports(),
        Commands::Schedule {
            app,
            report_type,
            start,
            end,
        } => cli::commands::cmd_schedule(app, report_type, start, end),
        Commands::State {
            app,
            report_type,
            start,
            end,
        } => cli::commands::cmd_state(app, report_type, start, end),
        Commands::Download {
            file_name,
            output,
            rows,
        } => cli::commands::cmd_download(file_name, output.as_deref(), *rows),
        Commands::Delete { file_name } => cli::commands::cmd_delete(file_name),
        Commands::DeleteAll => cli::commands::cmd_delete_all(),
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
