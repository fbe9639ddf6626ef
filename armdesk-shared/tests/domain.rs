use armdesk_shared::api::endpoints;
use armdesk_shared::domain::{
    ArmState, Building, BuildingStatus, ProEvent, building_status, filter_buildings,
};

fn proevent(id: i64, state: ArmState) -> ProEvent {
    ProEvent {
        id,
        name: format!("Zone {id}"),
        building_id: 1,
        state,
        is_ignored: false,
    }
}

fn building(id: i64, name: &str) -> Building {
    Building {
        id,
        name: name.to_string(),
        start_time: None,
    }
}

#[test]
fn empty_list_has_no_devices() {
    assert_eq!(building_status(&[]), BuildingStatus::NoDevices);
}

#[test]
fn all_armed_requires_every_device_armed() {
    let all = vec![proevent(1, ArmState::Armed), proevent(2, ArmState::Armed)];
    assert_eq!(building_status(&all), BuildingStatus::AllArmed);

    let mixed = vec![proevent(1, ArmState::Armed), proevent(2, ArmState::Unknown)];
    assert_eq!(building_status(&mixed), BuildingStatus::PartiallyArmed);
}

#[test]
fn zero_armed_with_devices_is_all_disarmed() {
    let down = vec![
        proevent(1, ArmState::Disarmed),
        proevent(2, ArmState::Disarmed),
    ];
    assert_eq!(building_status(&down), BuildingStatus::AllDisarmed);

    // Unknown counts as not armed.
    let unknown = vec![proevent(1, ArmState::Unknown)];
    assert_eq!(building_status(&unknown), BuildingStatus::AllDisarmed);
}

#[test]
fn partially_armed_sits_strictly_between() {
    let mixed = vec![
        proevent(1, ArmState::Armed),
        proevent(2, ArmState::Disarmed),
        proevent(3, ArmState::Armed),
    ];
    assert_eq!(building_status(&mixed), BuildingStatus::PartiallyArmed);
}

#[test]
fn reactive_state_decoding() {
    assert_eq!(ArmState::from_reactive(0), ArmState::Armed);
    assert_eq!(ArmState::from_reactive(1), ArmState::Disarmed);
    assert_eq!(ArmState::from_reactive(2), ArmState::Unknown);
    assert_eq!(ArmState::from_reactive(-1), ArmState::Unknown);
}

#[test]
fn building_filter_is_case_insensitive_substring() {
    let list = vec![
        building(1, "Main Plant"),
        building(2, "North Warehouse"),
        building(3, "South Warehouse"),
    ];

    let hits = filter_buildings(&list, "warehouse");
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|b| b.name.contains("Warehouse")));

    let one = filter_buildings(&list, "MAIN");
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].id, 1);

    assert!(filter_buildings(&list, "plaza").is_empty());
}

#[test]
fn blank_filter_keeps_everything() {
    let list = vec![building(1, "Main Plant"), building(2, "Annex")];
    assert_eq!(filter_buildings(&list, "").len(), 2);
    assert_eq!(filter_buildings(&list, "   ").len(), 2);
}

#[test]
fn device_url_carries_filters() {
    let url = endpoints::devices("http://127.0.0.1:7070", 5, Some(100), Some("front door"));
    assert!(url.starts_with("http://127.0.0.1:7070/api/devices?building=5"));
    assert!(url.contains("&limit=100"));
    assert!(url.contains("&search=front%20door"));
}

#[test]
fn device_url_omits_blank_search() {
    let url = endpoints::devices("http://127.0.0.1:7070/", 5, None, Some(""));
    assert_eq!(url, "http://127.0.0.1:7070/api/devices?building=5");
}

#[test]
fn query_names_are_percent_encoded() {
    let url = endpoints::admin_query("http://h", "panel devices");
    assert_eq!(url, "http://h/api/admin/queries/panel%20devices");
}
