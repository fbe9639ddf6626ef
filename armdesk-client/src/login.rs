use std::path::Path;

use armdesk_shared::api::rest::{self, RestError};
use armdesk_shared::api::LoginReq;

use crate::config::{self, ClientConfig};
use crate::session::{self, Session, SessionStore};
use crate::{AppError, notice, prompt};

pub async fn login(
    server_arg: Option<String>,
    username_arg: Option<String>,
    cfg_path: &Path,
    store: &SessionStore,
) -> Result<(), AppError> {
    // Resolve server url: CLI arg > config if present > prompt.
    let server_url = match server_arg {
        Some(s) => config::normalize_server_url(&s),
        None => match config::load_config(cfg_path) {
            Ok(cfg) => cfg.server_url,
            Err(_) => {
                config::normalize_server_url(&prompt("Server URL (e.g., http://127.0.0.1:7070): ")?)
            }
        },
    };
    config::validate_server_url(&server_url)?;

    // A stored session that still verifies skips the login form.
    if let Some(existing) = store.load()? {
        if session::verify(&server_url, store, &existing).await {
            notice(&format!("Already logged in as {}.", existing.username));
            return Ok(());
        }
    }

    let username = match username_arg {
        Some(u) => u,
        None => prompt("Username: ")?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    let session = authenticate(&server_url, &username, &password, store).await?;

    config::save_config(
        cfg_path,
        &ClientConfig {
            server_url: server_url.clone(),
        },
    )?;

    notice(&format!("Logged in as {}.", session.username));
    if session.is_admin {
        notice("Admin commands are available: queries, users.");
    }
    Ok(())
}

/// Posts the credentials and persists the returned session. The
/// interactive wrapper above owns all prompting.
pub async fn authenticate(
    base: &str,
    username: &str,
    password: &str,
    store: &SessionStore,
) -> Result<Session, AppError> {
    let req = LoginReq {
        username: username.to_string(),
        password: password.to_string(),
    };
    let resp = match rest::login(base, &req).await {
        Ok(v) => v,
        Err(RestError::Status { status: 401, detail }) => {
            return Err(AppError::Api(if detail.is_empty() {
                "Invalid credentials".to_string()
            } else {
                detail
            }));
        }
        Err(e) => return Err(AppError::Api(format!("login failed: {e}"))),
    };
    let session = Session {
        token: resp.access_token,
        username: resp.username,
        is_admin: resp.is_admin,
    };
    store.save(&session)?;
    Ok(session)
}
