use ps_project::{ProjectError, ValidationError};
use std::path::Path;

fn demos() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

#[test]
fn demos_load_and_validate() {
    for name in ["water_plant.yaml", "chlorine_dosing.json"] {
        let path = demos().join(name);
        ps_project::load(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
    }
}

#[test]
fn water_plant_shape() {
    let config = ps_project::load_yaml(&demos().join("water_plant.yaml")).unwrap();

    assert_eq!(config.settings.speed, 1.0);
    assert_eq!(config.devices.len(), 5);
    assert_eq!(config.sensors.len(), 3);

    let pump = config.devices.iter().find(|d| d.label == "pump1").unwrap();
    assert_eq!(pump.state.as_deref(), Some("on"));
    assert_eq!(pump.flow_rate, Some(2.0));

    assert_eq!(config.connections["valve1"].outputs, vec!["pump1".to_string()]);
    assert_eq!(
        config.plcs["plant1"].sensors,
        vec!["tank1_volume", "pump1_state", "ph1"]
    );
}

#[test]
fn settings_default_when_omitted() {
    let config = ps_project::parse_yaml("devices:\n  - role: tank\n    label: t1\n").unwrap();
    assert_eq!(config.settings.speed, 1.0);
    assert_eq!(config.settings.read_period_s, 1.0);
    assert!(config.plcs.is_empty());
}

#[test]
fn missing_required_field_is_a_parse_error() {
    let err = ps_project::parse_yaml("devices:\n  - label: t1\n").unwrap_err();
    assert!(matches!(err, ProjectError::Yaml(_)));
}

#[test]
fn validation_runs_on_load() {
    let err = ps_project::parse_json(r#"{"settings": {"speed": -1.0}}"#).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Validation(ValidationError::InvalidValue { .. })
    ));
}

#[test]
fn roundtrip_yaml() {
    let config = ps_project::load_yaml(&demos().join("water_plant.yaml")).unwrap();
    let path = std::env::temp_dir().join("ps_project_roundtrip.yaml");
    ps_project::save_yaml(&path, &config).unwrap();
    let loaded = ps_project::load_yaml(&path).unwrap();
    assert_eq!(config, loaded);
}
