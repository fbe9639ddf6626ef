use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use armdesk_shared::api::rest::{self, RestError};
use armdesk_shared::api::ChangePasswordReq;

use crate::{AppError, confirm, notice};

/// The three persisted session entries: bearer token, username, admin
/// flag. Passed explicitly into every facade call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub is_admin: bool,
}

/// File-backed session storage beside the client config.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn beside_config(config_path: &Path) -> Self {
        Self {
            path: config_path.with_file_name("session.yaml"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>, AppError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Config(format!(
                    "read {} failed: {e}",
                    self.path.display()
                )));
            }
        };
        let session: Session = serde_yaml::from_str(&data)
            .map_err(|e| AppError::Config(format!("parse {} failed: {e}", self.path.display())))?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let data = serde_yaml::to_string(session)
            .map_err(|e| AppError::Config(format!("serialize session failed: {e}")))?;
        std::fs::write(&self.path, data)
            .map_err(|e| AppError::Config(format!("write {} failed: {e}", self.path.display())))
    }

    /// Best-effort removal; an absent file is fine.
    pub fn clear(&self) {
        let _ = std::fs::remove_file(&self.path);
    }

    /// Drops the persisted session after the server rejected its token.
    pub fn expire(&self) {
        self.clear();
        notice("Session expired. Please log in again.");
    }
}

pub fn require_session(store: &SessionStore) -> Result<Session, AppError> {
    store.load()?.ok_or(AppError::NotLoggedIn)
}

pub fn require_admin(session: &Session) -> Result<(), AppError> {
    if session.is_admin {
        Ok(())
    } else {
        notice("Admin privileges are required for this command.");
        Err(AppError::NotAdmin)
    }
}

/// Routes every API result through the one cross-cutting rule of the
/// console: a 401 from any authenticated call invalidates the stored
/// session. A 403 is surfaced without touching the session.
pub fn api_result<T>(store: &SessionStore, res: Result<T, RestError>) -> Result<T, AppError> {
    match res {
        Ok(v) => Ok(v),
        Err(RestError::Status { status: 401, .. }) => {
            store.expire();
            Err(AppError::SessionExpired)
        }
        Err(RestError::Status { status: 403, detail }) => Err(AppError::Api(if detail.is_empty() {
            "forbidden".to_string()
        } else {
            detail
        })),
        Err(RestError::Status { status, detail }) => Err(AppError::Api(if detail.is_empty() {
            format!("request failed with status {status}")
        } else {
            detail
        })),
        Err(e) => Err(AppError::Api(e.to_string())),
    }
}

/// Probes a protected read endpoint. Any failure, including a transport
/// one, means the locally stored token can no longer be trusted to
/// reflect server-side revocation; the session is dropped.
pub async fn verify(base: &str, store: &SessionStore, session: &Session) -> bool {
    let probe = if session.is_admin {
        rest::list_queries(base, &session.token).await.map(|_| ())
    } else {
        rest::list_buildings(base, &session.token).await.map(|_| ())
    };
    match probe {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "session verification failed");
            store.clear();
            false
        }
    }
}

pub fn logout(store: &SessionStore, assume_yes: bool) -> Result<(), AppError> {
    if store.load()?.is_none() {
        notice("Not logged in.");
        return Ok(());
    }
    if !confirm("Log out and discard the stored session?", assume_yes)? {
        notice("Logout cancelled.");
        return Ok(());
    }
    store.clear();
    notice("Logged out.");
    Ok(())
}

/// Self-service password change. A successful change invalidates the
/// server-side session, so the stored one is dropped to force re-login.
pub async fn change_password(
    base: &str,
    store: &SessionStore,
    session: &Session,
) -> Result<(), AppError> {
    let current_password = rpassword::prompt_password("Current password: ")?;
    let new_password = rpassword::prompt_password("New password: ")?;
    let repeat = rpassword::prompt_password("Repeat new password: ")?;
    if new_password != repeat {
        return Err(AppError::Validation("passwords do not match".into()));
    }
    if new_password.is_empty() {
        return Err(AppError::Validation("password must not be empty".into()));
    }
    let req = ChangePasswordReq {
        current_password,
        new_password,
    };
    let resp = api_result(
        store,
        rest::change_password(base, &session.token, &req).await,
    )?;
    store.clear();
    notice(&resp.message);
    notice("Please log in again.");
    Ok(())
}
