use armdesk_shared::api::rest;
use armdesk_shared::api::{UserCreateReq, UserUpdateReq};

use crate::session::{Session, SessionStore, api_result};
use crate::{AppError, confirm, notice};

pub async fn ls(base: &str, store: &SessionStore, session: &Session) -> Result<(), AppError> {
    let users = api_result(store, rest::list_users(base, &session.token).await)?;
    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }
    println!("{:>6}  {:<24} {:<9} CREATED", "ID", "USERNAME", "ROLE");
    for u in users {
        println!(
            "{:>6}  {:<24} {:<9} {}",
            u.id,
            u.username,
            if u.is_admin { "admin" } else { "operator" },
            u.created_at.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub async fn add(
    base: &str,
    store: &SessionStore,
    session: &Session,
    username: &str,
    admin: bool,
) -> Result<(), AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username must not be empty".into()));
    }
    let password = prompt_new_password()?;
    let req = UserCreateReq {
        username: username.to_string(),
        password,
        is_admin: admin,
    };
    let resp = api_result(store, rest::create_user(base, &session.token, &req).await)?;
    notice(&resp.message);
    Ok(())
}

pub async fn edit(
    base: &str,
    store: &SessionStore,
    session: &Session,
    id: i64,
    username: Option<String>,
    admin: Option<bool>,
    set_password: bool,
) -> Result<(), AppError> {
    if username.is_none() && admin.is_none() && !set_password {
        return Err(AppError::Validation(
            "nothing to change; pass --username, --admin or --password".into(),
        ));
    }
    let password = if set_password {
        Some(prompt_new_password()?)
    } else {
        None
    };
    let req = UserUpdateReq {
        username,
        password,
        is_admin: admin,
    };
    let resp = api_result(
        store,
        rest::update_user(base, &session.token, id, &req).await,
    )?;
    notice(&resp.message);
    Ok(())
}

pub async fn rm(
    base: &str,
    store: &SessionStore,
    session: &Session,
    id: i64,
    assume_yes: bool,
) -> Result<(), AppError> {
    if !confirm(&format!("Delete user {id}?"), assume_yes)? {
        notice("Cancelled.");
        return Ok(());
    }
    let resp = api_result(store, rest::delete_user(base, &session.token, id).await)?;
    notice(&resp.message);
    Ok(())
}

fn prompt_new_password() -> Result<String, AppError> {
    let first = rpassword::prompt_password("New password: ")?;
    let second = rpassword::prompt_password("Repeat new password: ")?;
    if first != second {
        return Err(AppError::Validation("passwords do not match".into()));
    }
    if first.is_empty() {
        return Err(AppError::Validation("password must not be empty".into()));
    }
    Ok(first)
}
