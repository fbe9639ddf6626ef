use std::io::{self, Write};

pub mod buildings;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod login;
pub mod proevents;
pub mod queries;
pub mod session;
pub mod users;
pub mod watch;

pub use cli::{BuildingsAction, Cli, Command, ProeventsAction, QueriesAction, UsersAction};

use session::{Session, SessionStore};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error("{0}")]
    Api(String),
    #[error("{0}")]
    Validation(String),
    #[error("session expired; please log in again")]
    SessionExpired,
    #[error("not logged in; run `armdesk login` first")]
    NotLoggedIn,
    #[error("admin privileges required")]
    NotAdmin,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Transient operator notices go to stderr so they never mix with
/// rendered listings on stdout.
pub(crate) fn notice(msg: &str) {
    eprintln!("{msg}");
}

pub(crate) fn prompt(msg: &str) -> Result<String, AppError> {
    print!("{}", msg);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_string())
}

pub(crate) fn confirm(msg: &str, assume_yes: bool) -> Result<bool, AppError> {
    if assume_yes {
        return Ok(true);
    }
    let answer = prompt(&format!("{msg} [y/N]: "))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    init_tracing();

    let cfg_path = config::resolve_config_path(cli.config.clone())?;
    let store = SessionStore::beside_config(&cfg_path);

    match cli.command {
        Command::Login { server, username } => {
            login::login(server, username, &cfg_path, &store).await
        }
        Command::Logout { yes } => session::logout(&store, yes),
        Command::Whoami => {
            let (base, sess) = protected(&cfg_path, &store)?;
            whoami(&base, &store, &sess).await
        }
        Command::ChangePassword => {
            let (base, sess) = protected(&cfg_path, &store)?;
            session::change_password(&base, &store, &sess).await
        }
        Command::Buildings { action } => {
            let (base, sess) = protected(&cfg_path, &store)?;
            match action {
                BuildingsAction::Ls { search } => {
                    buildings::ls(&base, &store, &sess, search.as_deref()).await
                }
                BuildingsAction::Status { search } => {
                    buildings::status(&base, &store, &sess, search.as_deref()).await
                }
                BuildingsAction::SetTime {
                    building,
                    start_time,
                } => buildings::set_time(&base, &store, &sess, building, &start_time).await,
            }
        }
        Command::Proevents { action } => {
            let (base, sess) = protected(&cfg_path, &store)?;
            match action {
                ProeventsAction::Ls {
                    building,
                    limit,
                    search,
                } => proevents::ls(&base, &store, &sess, building, limit, search.as_deref()).await,
                ProeventsAction::Ignore {
                    building,
                    on,
                    off,
                    yes,
                } => proevents::apply_ignore(&base, &store, &sess, building, &on, &off, yes).await,
            }
        }
        Command::Watch { interval } => {
            let (base, sess) = protected(&cfg_path, &store)?;
            watch::run(&base, &store, &sess, interval).await
        }
        Command::Queries { action } => {
            let (base, sess) = protected(&cfg_path, &store)?;
            session::require_admin(&sess)?;
            match action {
                QueriesAction::Ls => queries::ls(&base, &store, &sess).await,
                QueriesAction::Show { name } => queries::show(&base, &store, &sess, &name).await,
                QueriesAction::Default { name } => {
                    queries::show_default(&base, &store, &sess, &name).await
                }
                QueriesAction::Edit { name } => queries::edit(&base, &store, &sess, &name).await,
                QueriesAction::Save {
                    name,
                    sql_file,
                    device_type,
                    table,
                    description,
                    yes,
                } => {
                    queries::save(
                        &base,
                        &store,
                        &sess,
                        &name,
                        sql_file,
                        device_type,
                        table,
                        description,
                        yes,
                    )
                    .await
                }
                QueriesAction::Test { name } => queries::test(&base, &store, &sess, &name).await,
                QueriesAction::Revert { name, yes } => {
                    queries::revert(&base, &store, &sess, &name, yes).await
                }
            }
        }
        Command::Users { action } => {
            let (base, sess) = protected(&cfg_path, &store)?;
            session::require_admin(&sess)?;
            match action {
                UsersAction::Ls => users::ls(&base, &store, &sess).await,
                UsersAction::Add { username, admin } => {
                    users::add(&base, &store, &sess, &username, admin).await
                }
                UsersAction::Edit {
                    id,
                    username,
                    admin,
                    password,
                } => users::edit(&base, &store, &sess, id, username, admin, password).await,
                UsersAction::Rm { id, yes } => users::rm(&base, &store, &sess, id, yes).await,
            }
        }
    }
}

/// Loads the config and the stored session for a protected command.
fn protected(
    cfg_path: &std::path::Path,
    store: &SessionStore,
) -> Result<(String, Session), AppError> {
    let cfg = config::load_config(cfg_path)?;
    let sess = session::require_session(store)?;
    Ok((cfg.server_url, sess))
}

async fn whoami(base: &str, store: &SessionStore, sess: &Session) -> Result<(), AppError> {
    if session::verify(base, store, sess).await {
        println!(
            "Logged in as {} ({}).",
            sess.username,
            if sess.is_admin { "admin" } else { "operator" }
        );
        Ok(())
    } else {
        Err(AppError::SessionExpired)
    }
}
