use super::*;
use crate::scheduler::frameloop::TimingMode;

#[test]
fn defaults_are_valid() {
    let cfg = EngineConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.transition.duration_ms, DEFAULT_TRANSITION_MS);
    assert!(cfg.hardware_acceleration);
    assert_eq!(cfg.scheduler.timing, TimingMode::Driven);
}

#[test]
fn partial_json_fills_defaults() {
    let cfg = EngineConfig::from_json_str(
        r#"{"scheduler":{"timing":"manual"},"transition":{"duration_ms":120,"ease":"linear"}}"#,
    )
    .unwrap();
    assert_eq!(cfg.scheduler.timing, TimingMode::Manual);
    assert_eq!(cfg.scheduler.max_delta_ms, 40.0);
    assert_eq!(cfg.transition.duration_ms, 120.0);
    assert_eq!(cfg.transition.delay_ms, 0.0);
    assert_eq!(cfg.transition.ease, Ease::Linear);
    assert!(cfg.hardware_acceleration);
}

#[test]
fn invalid_values_are_rejected() {
    assert!(EngineConfig::from_json_str(r#"{"transition":{"duration_ms":-1}}"#).is_err());
    assert!(
        EngineConfig::from_json_str(r#"{"transition":{"duration_ms":10,"delay_ms":-5}}"#)
            .is_err()
    );
    assert!(EngineConfig::from_json_str(r#"{"scheduler":{"max_delta_ms":0}}"#).is_err());
    assert!(EngineConfig::from_json_str("not json").is_err());
}

#[test]
fn settings_mirror_config() {
    let cfg = EngineConfig {
        hardware_acceleration: false,
        ..EngineConfig::default()
    };
    let settings = cfg.projection_settings();
    assert!(!settings.hardware_acceleration);
    assert_eq!(settings.transition, cfg.transition);
}
