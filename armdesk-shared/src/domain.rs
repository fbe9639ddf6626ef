use std::fmt;

use serde::{Deserialize, Serialize};

/// Reactive state of a proevent. The panel service encodes it as an
/// integer: 0 is reactive (armed), 1 is non-reactive (disarmed); any other
/// value means the state could not be determined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmState {
    Armed,
    Disarmed,
    Unknown,
}

impl ArmState {
    pub fn from_reactive(raw: i32) -> Self {
        match raw {
            0 => ArmState::Armed,
            1 => ArmState::Disarmed,
            _ => ArmState::Unknown,
        }
    }
}

impl fmt::Display for ArmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArmState::Armed => "armed",
            ArmState::Disarmed => "disarmed",
            ArmState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: i64,
    pub name: String,
    pub start_time: Option<String>,
}

/// An alarm-capable device record shown in a building's device list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProEvent {
    pub id: i64,
    pub name: String,
    pub building_id: i64,
    pub state: ArmState,
    pub is_ignored: bool,
}

/// Arm-state rollup for one building's proevent list.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingStatus {
    AllArmed,
    PartiallyArmed,
    AllDisarmed,
    NoDevices,
}

impl fmt::Display for BuildingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildingStatus::AllArmed => "all armed",
            BuildingStatus::PartiallyArmed => "partially armed",
            BuildingStatus::AllDisarmed => "all disarmed",
            BuildingStatus::NoDevices => "no proevents",
        };
        f.write_str(s)
    }
}

/// Classifies a proevent list. A device in an unknown state counts as
/// not armed.
pub fn building_status(proevents: &[ProEvent]) -> BuildingStatus {
    if proevents.is_empty() {
        return BuildingStatus::NoDevices;
    }
    let armed = proevents
        .iter()
        .filter(|p| p.state == ArmState::Armed)
        .count();
    if armed == proevents.len() {
        BuildingStatus::AllArmed
    } else if armed == 0 {
        BuildingStatus::AllDisarmed
    } else {
        BuildingStatus::PartiallyArmed
    }
}

/// Case-insensitive substring filter over an already-fetched building
/// list; the dropdown filter never goes back to the server. An empty or
/// blank query keeps every building.
pub fn filter_buildings<'a>(buildings: &'a [Building], query: &str) -> Vec<&'a Building> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return buildings.iter().collect();
    }
    buildings
        .iter()
        .filter(|b| b.name.to_lowercase().contains(&needle))
        .collect()
}
