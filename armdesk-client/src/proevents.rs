use std::collections::HashSet;

use armdesk_shared::api::rest;
use armdesk_shared::api::{BulkIgnoreReq, IgnoreEditDto};
use armdesk_shared::domain::{self, ProEvent};

use crate::buildings::DEVICE_FETCH_LIMIT;
use crate::session::{Session, SessionStore, api_result};
use crate::{AppError, confirm, notice};

/// Distinguishes an empty building from a search that matched nothing.
pub fn empty_message(search: Option<&str>) -> &'static str {
    match search {
        Some(s) if !s.trim().is_empty() => "No proevents found matching search.",
        _ => "No proevents found.",
    }
}

pub async fn ls(
    base: &str,
    store: &SessionStore,
    session: &Session,
    building: i64,
    limit: Option<u32>,
    search: Option<&str>,
) -> Result<(), AppError> {
    let dtos = api_result(
        store,
        rest::list_devices(base, &session.token, building, limit, search).await,
    )?;
    if dtos.is_empty() {
        println!("{}", empty_message(search));
        return Ok(());
    }
    let proevents: Vec<ProEvent> = dtos.into_iter().map(Into::into).collect();
    println!("{:>8}  {:<40} {:<9} IGNORE ON DISARM", "ID", "NAME", "STATE");
    for p in &proevents {
        println!(
            "{:>8}  {:<40} {:<9} {}",
            p.id,
            p.name,
            p.state.to_string(),
            if p.is_ignored { "yes" } else { "no" }
        );
    }
    println!("Status: {}", domain::building_status(&proevents));
    Ok(())
}

/// Builds the edit list for a bulk ignore update. Only devices whose flag
/// actually changes produce an edit.
pub fn stage_edits(
    proevents: &[ProEvent],
    building: i64,
    on: &[i64],
    off: &[i64],
) -> Vec<IgnoreEditDto> {
    let mut edits = Vec::new();
    for p in proevents {
        let desired = if on.contains(&p.id) {
            Some(true)
        } else if off.contains(&p.id) {
            Some(false)
        } else {
            None
        };
        if let Some(want) = desired {
            if want != p.is_ignored {
                edits.push(IgnoreEditDto {
                    item_id: p.id,
                    building_id: building,
                    device_id: p.id,
                    ignore: want,
                });
            }
        }
    }
    edits
}

/// Saves staged ignore-flag changes, then triggers re-evaluation. The two
/// calls are separately-failable stages: a re-evaluation failure must not
/// read as a save failure.
pub async fn apply_ignore(
    base: &str,
    store: &SessionStore,
    session: &Session,
    building: i64,
    on: &[i64],
    off: &[i64],
    assume_yes: bool,
) -> Result<(), AppError> {
    if on.is_empty() && off.is_empty() {
        return Err(AppError::Validation(
            "nothing to change; pass --on and/or --off".into(),
        ));
    }
    if let Some(dup) = on.iter().find(|id| off.contains(id)) {
        return Err(AppError::Validation(format!(
            "proevent {dup} listed in both --on and --off"
        )));
    }

    let dtos = api_result(
        store,
        rest::list_devices(
            base,
            &session.token,
            building,
            Some(DEVICE_FETCH_LIMIT),
            None,
        )
        .await,
    )?;
    if dtos.is_empty() {
        println!("No proevents found.");
        return Ok(());
    }
    let proevents: Vec<ProEvent> = dtos.into_iter().map(Into::into).collect();

    let known: HashSet<i64> = proevents.iter().map(|p| p.id).collect();
    let unknown: Vec<i64> = on
        .iter()
        .chain(off.iter())
        .filter(|id| !known.contains(id))
        .copied()
        .collect();
    if !unknown.is_empty() {
        return Err(AppError::Validation(format!(
            "unknown proevent ids for building {building}: {unknown:?}"
        )));
    }

    let edits = stage_edits(&proevents, building, on, off);
    if edits.is_empty() {
        notice("No changes to save.");
        return Ok(());
    }
    if !confirm(
        &format!(
            "Save {} ignore change(s) for building {building}?",
            edits.len()
        ),
        assume_yes,
    )? {
        notice("Cancelled.");
        return Ok(());
    }

    // Stage one: persist the flags.
    api_result(
        store,
        rest::bulk_set_ignore(base, &session.token, &BulkIgnoreReq { items: edits.clone() }).await,
    )
    .map_err(|e| match e {
        AppError::SessionExpired => e,
        other => AppError::Api(format!("saving ignore changes failed: {other}")),
    })?;
    notice(&format!("Saved {} ignore change(s).", edits.len()));

    // Stage two: re-evaluate the building with the new flags.
    notice("Applying re-evaluation...");
    api_result(
        store,
        rest::reevaluate_building(base, &session.token, building).await,
    )
    .map_err(|e| match e {
        AppError::SessionExpired => e,
        other => AppError::Api(format!("changes saved, but re-evaluation failed: {other}")),
    })?;
    notice("Re-evaluation applied.");
    Ok(())
}
