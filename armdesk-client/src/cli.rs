use std::path::PathBuf;

use clap::{Parser, Subcommand};

const HELP_EPILOG: &str = r#"Config resolution order:
  1) --config/-c PATH
  2) $ARMDESK_CONFIG
  3) XDG default: ~/.config/armdesk/client.yaml

The stored session (token, username, admin flag) lives beside the config
file as session.yaml.
"#;

#[derive(Debug, Parser)]
#[command(
    name = "armdesk",
    version,
    about = "Operator console for the building alarm monitor",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in to the server and store the session locally
    Login {
        /// Server URL (e.g., http://127.0.0.1:7070). Falls back to config or prompt.
        #[arg(long)]
        server: Option<String>,
        /// Username. Falls back to prompt.
        #[arg(long)]
        username: Option<String>,
    },
    /// Discard the stored session
    Logout {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// Show the stored session and verify it against the server
    Whoami,
    /// Change the password of the logged-in user (forces re-login)
    ChangePassword,
    /// Building listing, status rollups and schedules
    Buildings {
        #[command(subcommand)]
        action: BuildingsAction,
    },
    /// Per-building proevent listing and ignore-flag management
    Proevents {
        #[command(subcommand)]
        action: ProeventsAction,
    },
    /// Live status rollup; Enter refreshes, Ctrl-C exits
    Watch {
        /// Refresh interval in seconds
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },
    /// SQL query template management (admin)
    Queries {
        #[command(subcommand)]
        action: QueriesAction,
    },
    /// User management (admin)
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum BuildingsAction {
    /// List buildings, optionally filtered by a name substring
    Ls {
        /// Case-insensitive name filter, applied locally
        #[arg(long)]
        search: Option<String>,
    },
    /// Show the arm-state rollup for each building
    Status {
        /// Case-insensitive name filter, applied locally
        #[arg(long)]
        search: Option<String>,
    },
    /// Update a building's schedule start time
    SetTime {
        #[arg(long)]
        building: i64,
        /// Start time in HH:MM
        #[arg(long)]
        start_time: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProeventsAction {
    /// List proevents for a building
    Ls {
        #[arg(long)]
        building: i64,
        /// Maximum number of rows to fetch
        #[arg(long)]
        limit: Option<u32>,
        /// Server-side name filter
        #[arg(long)]
        search: Option<String>,
    },
    /// Stage and save ignore-on-disarm flag changes, then re-evaluate
    Ignore {
        #[arg(long)]
        building: i64,
        /// Proevent ids to set the ignore flag on
        #[arg(long, value_delimiter = ',')]
        on: Vec<i64>,
        /// Proevent ids to clear the ignore flag on
        #[arg(long, value_delimiter = ',')]
        off: Vec<i64>,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum QueriesAction {
    /// List query templates with customization state
    Ls,
    /// Show a template's SQL and derived basic-mode fields
    Show { name: String },
    /// Show the built-in default for a template
    Default { name: String },
    /// Edit a template interactively (basic/advanced modes)
    Edit { name: String },
    /// Save a template non-interactively
    Save {
        name: String,
        /// Raw SQL file (advanced mode); mutually exclusive with the field flags
        #[arg(long)]
        sql_file: Option<PathBuf>,
        /// Device type numeral substituted into the recognized filter clause
        #[arg(long)]
        device_type: Option<String>,
        /// Identifier substituted for the recognized source table
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// Ask the server to syntax-check a template
    Test { name: String },
    /// Delete the server-side customization, reverting to the default
    Revert {
        name: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum UsersAction {
    /// List users
    Ls,
    /// Add a user (password is prompted)
    Add {
        #[arg(long)]
        username: String,
        /// Grant admin privileges
        #[arg(long)]
        admin: bool,
    },
    /// Edit a user
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        admin: Option<bool>,
        /// Prompt for a new password
        #[arg(long)]
        password: bool,
    },
    /// Remove a user
    Rm {
        #[arg(long)]
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}
