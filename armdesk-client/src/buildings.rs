use armdesk_shared::api::ScheduleUpdateReq;
use armdesk_shared::api::rest;
use armdesk_shared::domain::{self, ArmState, Building, ProEvent};
use tracing::debug;

use crate::session::{Session, SessionStore, api_result};
use crate::AppError;

/// The backend caps device listings at this size; matches the service's
/// own bulk-fetch limit.
pub(crate) const DEVICE_FETCH_LIMIT: u32 = 1000;

pub async fn ls(
    base: &str,
    store: &SessionStore,
    session: &Session,
    search: Option<&str>,
) -> Result<(), AppError> {
    let buildings = fetch_buildings(base, store, session).await?;
    let filtered = domain::filter_buildings(&buildings, search.unwrap_or(""));
    if filtered.is_empty() {
        if buildings.is_empty() {
            println!("No buildings found.");
        } else {
            println!("No buildings match '{}'.", search.unwrap_or(""));
        }
        return Ok(());
    }
    println!("{:>6}  {:<32} START TIME", "ID", "NAME");
    for b in filtered {
        println!(
            "{:>6}  {:<32} {}",
            b.id,
            b.name,
            b.start_time.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub async fn status(
    base: &str,
    store: &SessionStore,
    session: &Session,
    search: Option<&str>,
) -> Result<(), AppError> {
    render_status(base, store, session, search).await
}

/// One line per building: armed count and the rollup classification.
/// Shared by the status command and the watch loop.
pub(crate) async fn render_status(
    base: &str,
    store: &SessionStore,
    session: &Session,
    search: Option<&str>,
) -> Result<(), AppError> {
    let buildings = fetch_buildings(base, store, session).await?;
    let filtered = domain::filter_buildings(&buildings, search.unwrap_or(""));
    if filtered.is_empty() {
        println!("No buildings found.");
        return Ok(());
    }
    for b in filtered {
        let dtos = api_result(
            store,
            rest::list_devices(base, &session.token, b.id, Some(DEVICE_FETCH_LIMIT), None).await,
        )?;
        let proevents: Vec<ProEvent> = dtos.into_iter().map(Into::into).collect();
        let armed = proevents
            .iter()
            .filter(|p| p.state == ArmState::Armed)
            .count();
        println!(
            "{:>6}  {:<32} {:>4}/{:<4} armed  {}",
            b.id,
            b.name,
            armed,
            proevents.len(),
            domain::building_status(&proevents)
        );
    }
    Ok(())
}

pub async fn set_time(
    base: &str,
    store: &SessionStore,
    session: &Session,
    building: i64,
    start_time: &str,
) -> Result<(), AppError> {
    let trimmed = start_time.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("start time must not be empty".into()));
    }
    if chrono::NaiveTime::parse_from_str(trimmed, "%H:%M").is_err() {
        return Err(AppError::Validation(format!(
            "invalid start time '{trimmed}'; expected HH:MM"
        )));
    }
    let req = ScheduleUpdateReq {
        building_id: building,
        start_time: trimmed.to_string(),
    };
    let resp = api_result(
        store,
        rest::update_building_time(base, &session.token, building, &req).await,
    )?;
    debug!(message = %resp.message, "schedule update confirmed");
    // Only report the new schedule after the server confirmed it.
    println!("Schedule updated: building {building} starts at {trimmed}.");
    Ok(())
}

async fn fetch_buildings(
    base: &str,
    store: &SessionStore,
    session: &Session,
) -> Result<Vec<Building>, AppError> {
    let dtos = api_result(store, rest::list_buildings(base, &session.token).await)?;
    Ok(dtos.into_iter().map(Into::into).collect())
}
