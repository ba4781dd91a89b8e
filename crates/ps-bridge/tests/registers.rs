//! Register bridge scenarios against a built plant.

use ps_bridge::{BridgeError, RegisterBridge, RegisterValue};
use ps_devices::{Actuation, PumpState, SensorReading};
use ps_graph::Plant;
use std::sync::Arc;

const PLANT: &str = r#"
devices:
  - role: tank
    label: tank1
    volume: 42.0
  - role: pump
    label: pump1
sensors:
  - role: volume
    label: tank1_volume
    monitors: tank1
  - role: state
    label: pump1_state
    monitors: pump1
  - role: ph
    label: ph1
plcs:
  plant1:
    sensors: [tank1_volume, pump1_state]
  lab:
    sensors: [ph1]
"#;

fn setup() -> (Arc<Plant>, RegisterBridge) {
    let config = ps_project::parse_yaml(PLANT).unwrap();
    let plant = Arc::new(ps_graph::build(&config).unwrap());
    let bridge = RegisterBridge::new(&plant, &config.plcs).unwrap();
    (plant, bridge)
}

#[test]
fn register_returns_current_table() {
    let (_plant, bridge) = setup();
    assert!(!bridge.is_registered("plant1").unwrap());

    let table = bridge.register("plant1").unwrap();
    assert!(bridge.is_registered("plant1").unwrap());
    assert_eq!(table["tank1_volume"].value, RegisterValue::Number(42.0));
    assert_eq!(table["tank1_volume"].address, 0);
    assert!(!table["tank1_volume"].writable);
    assert_eq!(table["pump1_state"].value, RegisterValue::Text("off".into()));
    assert_eq!(table["pump1_state"].address, 1);
    assert!(table["pump1_state"].writable);

    // Idempotent.
    assert_eq!(bridge.register("plant1").unwrap(), table);
}

#[test]
fn read_cycle_picks_up_sampled_volume_change() {
    let (plant, bridge) = setup();
    bridge.register("plant1").unwrap();

    plant.find("tank1").unwrap().set_volume(50.0).unwrap();
    let sensor = plant.find("tank1_volume").unwrap().id();
    plant.activate(sensor).unwrap();

    // The stored table only moves on a read cycle.
    let stale = bridge.snapshot("plant1").unwrap();
    assert_eq!(stale["tank1_volume"].value, RegisterValue::Number(42.0));

    bridge.refresh();
    assert_eq!(
        bridge.snapshot("plant1").unwrap()["tank1_volume"].value,
        RegisterValue::Number(50.0)
    );
    let values = bridge.read("plant1").unwrap();
    assert_eq!(values["tank1_volume"], RegisterValue::Number(50.0));
}

#[test]
fn reads_return_last_sample_without_touching_the_sensor() {
    let (plant, bridge) = setup();
    plant.find("tank1").unwrap().set_volume(50.0).unwrap();

    // No sensor activation yet, so every read path still sees the old sample.
    let values = bridge.read("plant1").unwrap();
    assert_eq!(values["tank1_volume"], RegisterValue::Number(42.0));
    bridge.refresh();
    bridge
        .write("plant1", "pump1_state", RegisterValue::Bool(false))
        .unwrap();
    assert_eq!(
        bridge.snapshot("plant1").unwrap()["tank1_volume"].value,
        RegisterValue::Number(42.0)
    );
    assert_eq!(
        plant.find("tank1_volume").unwrap().read_sensor().unwrap(),
        SensorReading::Number(42.0)
    );
}

#[test]
fn write_through_state_register_actuates_pump() {
    let (plant, bridge) = setup();

    bridge
        .write("plant1", "pump1_state", RegisterValue::Bool(true))
        .unwrap();
    assert_eq!(
        plant.find("pump1").unwrap().actuation(),
        Some(Actuation::Pump(PumpState::On))
    );
    assert_eq!(
        bridge.snapshot("plant1").unwrap()["pump1_state"].value,
        RegisterValue::Text("on".into())
    );

    bridge
        .write("plant1", "pump1_state", RegisterValue::Text("off".into()))
        .unwrap();
    assert_eq!(
        plant.find("pump1").unwrap().actuation(),
        Some(Actuation::Pump(PumpState::Off))
    );
}

#[test]
fn write_to_volume_register_is_read_only() {
    let (plant, bridge) = setup();
    let err = bridge
        .write("plant1", "tank1_volume", RegisterValue::Number(7.0))
        .unwrap_err();
    assert!(matches!(err, BridgeError::ReadOnlyRegister { .. }));
    assert_eq!(plant.find("tank1").unwrap().volume(), Some(42.0));
}

#[test]
fn invalid_written_value_is_rejected() {
    let (_plant, bridge) = setup();
    let err = bridge
        .write("plant1", "pump1_state", RegisterValue::Text("sideways".into()))
        .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidValue { .. }));

    // A valve state on a pump fails in the device layer.
    let err = bridge
        .write("plant1", "pump1_state", RegisterValue::Text("open".into()))
        .unwrap_err();
    assert!(matches!(err, BridgeError::Device(_)));
}

#[test]
fn lookup_misses_are_typed() {
    let (_plant, bridge) = setup();
    assert!(matches!(
        bridge.register("nobody"),
        Err(BridgeError::UnknownPlc { .. })
    ));
    assert!(matches!(
        bridge.read("nobody"),
        Err(BridgeError::UnknownPlc { .. })
    ));
    assert!(matches!(
        bridge.write("plant1", "ph1", RegisterValue::Null),
        Err(BridgeError::UnknownRegister { .. })
    ));
}

#[test]
fn unsampled_pass_through_sensor_reads_null() {
    let (_plant, bridge) = setup();
    let values = bridge.read("lab").unwrap();
    assert_eq!(values["ph1"], RegisterValue::Null);
    assert_eq!(bridge.plc_names(), vec!["lab".to_string(), "plant1".to_string()]);
}

#[test]
fn table_serializes_as_json() {
    let (_plant, bridge) = setup();
    let table = bridge.register("plant1").unwrap();
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["tank1_volume"]["value"], 42.0);
    assert_eq!(json["pump1_state"]["value"], "off");
}
