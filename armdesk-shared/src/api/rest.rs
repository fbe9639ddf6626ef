//! Minimal REST client helpers for console consumers.

use super::endpoints as ep;
use super::*;
use once_cell::sync::Lazy;
use std::time::Duration;

pub use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http: {0}")]
    Http(String),
    #[error("status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("serde: {0}")]
    Serde(String),
}

impl RestError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .tcp_keepalive(Some(Duration::from_secs(180)))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(180))
        .timeout(Duration::from_secs(60))
        .build()
        .expect("failed to build HTTP client")
});

fn mk_client() -> Result<reqwest::Client, RestError> {
    Ok(HTTP_CLIENT.clone())
}

/// Non-2xx responses surface the backend's `detail` field when the body
/// parses as JSON, otherwise the raw body text.
async fn handle_json<T: for<'de> serde::Deserialize<'de>>(
    res: reqwest::Response,
) -> Result<T, RestError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiMessage>(&body)
            .map(|m| m.detail)
            .unwrap_or(body);
        return Err(RestError::Status {
            status: status.as_u16(),
            detail,
        });
    }
    res.json::<T>()
        .await
        .map_err(|e| RestError::Serde(e.to_string()))
}

pub async fn login(base: &str, req: &LoginReq) -> Result<LoginResp, RestError> {
    let client = mk_client()?;
    let url = ep::admin_login(base);
    let res = client
        .post(url)
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn list_buildings(base: &str, bearer: &str) -> Result<Vec<BuildingDto>, RestError> {
    let client = mk_client()?;
    let url = ep::buildings(base);
    let res = client
        .get(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn update_building_time(
    base: &str,
    bearer: &str,
    building_id: i64,
    req: &ScheduleUpdateReq,
) -> Result<OkResp, RestError> {
    let client = mk_client()?;
    let url = ep::building_time(base, building_id);
    let res = client
        .post(url)
        .bearer_auth(bearer)
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn reevaluate_building(
    base: &str,
    bearer: &str,
    building_id: i64,
) -> Result<OkResp, RestError> {
    let client = mk_client()?;
    let url = ep::building_reevaluate(base, building_id);
    let res = client
        .post(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn list_devices(
    base: &str,
    bearer: &str,
    building_id: i64,
    limit: Option<u32>,
    search: Option<&str>,
) -> Result<Vec<ProEventDto>, RestError> {
    let client = mk_client()?;
    let url = ep::devices(base, building_id, limit, search);
    let res = client
        .get(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn bulk_set_ignore(
    base: &str,
    bearer: &str,
    req: &BulkIgnoreReq,
) -> Result<OkResp, RestError> {
    let client = mk_client()?;
    let url = ep::ignore_bulk(base);
    let res = client
        .post(url)
        .bearer_auth(bearer)
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn list_queries(base: &str, bearer: &str) -> Result<QueryListResp, RestError> {
    let client = mk_client()?;
    let url = ep::admin_queries(base);
    let res = client
        .get(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn get_query(base: &str, bearer: &str, name: &str) -> Result<QueryDto, RestError> {
    let client = mk_client()?;
    let url = ep::admin_query(base, name);
    let res = client
        .get(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn get_default_query(
    base: &str,
    bearer: &str,
    name: &str,
) -> Result<QueryDto, RestError> {
    let client = mk_client()?;
    let url = ep::admin_query_default(base, name);
    let res = client
        .get(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn test_query(base: &str, bearer: &str, name: &str) -> Result<QueryTestResp, RestError> {
    let client = mk_client()?;
    let url = ep::admin_query_test(base, name);
    let res = client
        .post(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn save_query(base: &str, bearer: &str, req: &QuerySaveReq) -> Result<OkResp, RestError> {
    let client = mk_client()?;
    let url = ep::admin_queries(base);
    let res = client
        .post(url)
        .bearer_auth(bearer)
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn delete_query(base: &str, bearer: &str, name: &str) -> Result<OkResp, RestError> {
    let client = mk_client()?;
    let url = ep::admin_query(base, name);
    let res = client
        .delete(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn list_users(base: &str, bearer: &str) -> Result<Vec<UserDto>, RestError> {
    let client = mk_client()?;
    let url = ep::admin_users(base);
    let res = client
        .get(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn create_user(
    base: &str,
    bearer: &str,
    req: &UserCreateReq,
) -> Result<OkResp, RestError> {
    let client = mk_client()?;
    let url = ep::admin_users(base);
    let res = client
        .post(url)
        .bearer_auth(bearer)
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn update_user(
    base: &str,
    bearer: &str,
    user_id: i64,
    req: &UserUpdateReq,
) -> Result<OkResp, RestError> {
    let client = mk_client()?;
    let url = ep::admin_user(base, user_id);
    let res = client
        .put(url)
        .bearer_auth(bearer)
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn delete_user(base: &str, bearer: &str, user_id: i64) -> Result<OkResp, RestError> {
    let client = mk_client()?;
    let url = ep::admin_user(base, user_id);
    let res = client
        .delete(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn change_password(
    base: &str,
    bearer: &str,
    req: &ChangePasswordReq,
) -> Result<OkResp, RestError> {
    let client = mk_client()?;
    let url = ep::admin_change_password(base);
    let res = client
        .post(url)
        .bearer_auth(bearer)
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}
