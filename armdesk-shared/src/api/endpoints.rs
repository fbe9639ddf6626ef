use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::API_PREFIX;

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

pub fn buildings(base: &str) -> String {
    base_join(base, &format!("{}/buildings", API_PREFIX))
}

pub fn building_time(base: &str, building_id: i64) -> String {
    base_join(base, &format!("{}/buildings/{}/time", API_PREFIX, building_id))
}

pub fn building_reevaluate(base: &str, building_id: i64) -> String {
    base_join(
        base,
        &format!("{}/buildings/{}/reevaluate", API_PREFIX, building_id),
    )
}

pub fn devices(base: &str, building_id: i64, limit: Option<u32>, search: Option<&str>) -> String {
    let mut url = base_join(base, &format!("{}/devices?building={}", API_PREFIX, building_id));
    if let Some(limit) = limit {
        url.push_str(&format!("&limit={}", limit));
    }
    if let Some(search) = search.filter(|s| !s.is_empty()) {
        url.push_str(&format!("&search={}", enc(search)));
    }
    url
}

pub fn ignore_bulk(base: &str) -> String {
    base_join(base, &format!("{}/proevents/ignore/bulk", API_PREFIX))
}

pub fn admin_login(base: &str) -> String {
    base_join(base, &format!("{}/admin/login", API_PREFIX))
}

pub fn admin_queries(base: &str) -> String {
    base_join(base, &format!("{}/admin/queries", API_PREFIX))
}

pub fn admin_query(base: &str, name: &str) -> String {
    base_join(base, &format!("{}/admin/queries/{}", API_PREFIX, enc(name)))
}

pub fn admin_query_default(base: &str, name: &str) -> String {
    base_join(
        base,
        &format!("{}/admin/queries/{}/default", API_PREFIX, enc(name)),
    )
}

pub fn admin_query_test(base: &str, name: &str) -> String {
    base_join(
        base,
        &format!("{}/admin/queries/{}/test", API_PREFIX, enc(name)),
    )
}

pub fn admin_users(base: &str) -> String {
    base_join(base, &format!("{}/admin/users", API_PREFIX))
}

pub fn admin_user(base: &str, user_id: i64) -> String {
    base_join(base, &format!("{}/admin/users/{}", API_PREFIX, user_id))
}

pub fn admin_change_password(base: &str) -> String {
    base_join(base, &format!("{}/admin/change-password", API_PREFIX))
}
