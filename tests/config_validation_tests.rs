//! Config Validation Tests
//!
//! Exercises typo detection and range validation of press_config.toml
//! independently from the simulator and model layers.

use press_advisor::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use press_advisor::config::{ConfigError, PressConfig};
use press_advisor::TunableParameter;

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_press_section_warns_with_suggestion() {
    let toml_str = r#"
[press]
naem = "Line-3"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].field.contains("naem"));
    // "naem" is distance 2 from "name"
    assert_eq!(warnings[0].suggestion.as_deref(), Some("press.name"));
}

#[test]
fn typo_in_nested_limit_band_warns() {
    let toml_str = r#"
[limits.bore_cm]
physcal_min = 3.0
physical_max = 12.0
recommended_min = 3.0
recommended_max = 8.5
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("limits.bore_cm.physical_min")
    );
}

#[test]
fn unrelated_section_warns_without_suggestion() {
    let toml_str = r#"
[telemetry]
endpoint = "udp://10.0.0.4:8125"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 2, "section and key both unknown");
    assert!(warnings.iter().all(|w| w.suggestion.is_none()));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[press]
name = "Line-3 Forming Press"
description = "200 t four-column"

[simulation]
relief_margin_percent = 12.0

[model_source]
url = "http://models.local/press/coefficients"
artifact_path = "/var/lib/press/model.json"
timeout_secs = 6
max_attempts = 4
jitter = false

[confidence]
high_threshold = 0.9

[confidence.weights]
pressure = 0.5
efficiency = 0.25
cycle_time = 0.25

[advisor]
max_suggestions = 3
rpm_step = 20.0

[limits]
rod_clearance_cm = 0.8

[limits.motor_rpm]
physical_min = 600.0
physical_max = 3000.0
recommended_min = 1000.0
recommended_max = 2800.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
}

#[test]
fn every_serialized_key_is_known() {
    let toml_str = PressConfig::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&toml_str).is_empty());
}

#[test]
fn suggestion_needs_close_match() {
    let known = known_config_keys();
    assert_eq!(
        suggest_correction("advisor.max_sugestions", &known).as_deref(),
        Some("advisor.max_suggestions")
    );
    assert!(suggest_correction("completely.different.thing", &known).is_none());
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn default_config_has_no_range_findings() {
    let (errors, warnings) = validate_physical_ranges(&PressConfig::default());
    assert!(errors.is_empty());
    assert!(warnings.is_empty());
}

#[test]
fn efficiency_above_unity_is_an_error() {
    let mut config = PressConfig::default();
    config.limits.pump_efficiency.physical_max = 1.2;
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("pump_efficiency")));
}

#[test]
fn slow_timeout_is_only_a_warning() {
    let mut config = PressConfig::default();
    config.model_source.timeout_secs = 20;
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert!(warnings.iter().any(|w| w.field == "model_source.timeout_secs"));
    assert!(config.validate().is_ok());
}

#[test]
fn recommended_band_outside_physical_range_rejected() {
    let toml_str = r#"
[limits.bore_cm]
physical_min = 3.0
physical_max = 12.0
recommended_min = 2.0
recommended_max = 8.5
"#;
    match PressConfig::from_toml_str(toml_str) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("limits.bore_cm")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn weights_must_sum_to_one() {
    let toml_str = r#"
[confidence.weights]
pressure = 0.6
efficiency = 0.6
cycle_time = 0.6
"#;
    assert!(matches!(
        PressConfig::from_toml_str(toml_str),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn rod_range_follows_bore() {
    let limits = PressConfig::default().limits;
    let (_, max_small) = limits.physical_range(TunableParameter::RodCm, 4.0);
    let (_, max_large) = limits.physical_range(TunableParameter::RodCm, 12.0);
    assert!((max_small - 3.5).abs() < 1e-9);
    assert!((max_large - 11.5).abs() < 1e-9);
}

// ============================================================================
// File Round Trip
// ============================================================================

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("press_config.toml");

    let mut config = PressConfig::default();
    config.press.name = "Line-7".to_string();
    config.model_source.url = Some("http://models.local/coefficients".to_string());
    config.advisor.max_suggestions = 2;
    config.save_to_file(&path).unwrap();

    let loaded = PressConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded.press.name, "Line-7");
    assert_eq!(loaded.model_source.url, config.model_source.url);
    assert_eq!(loaded.advisor.max_suggestions, 2);
    assert_eq!(loaded.limits.motor_rpm, config.limits.motor_rpm);
}

#[test]
fn typos_do_not_block_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("press_config.toml");
    std::fs::write(&path, "[advisor]\nmax_sugestions = 9\nrpm_step = 25.0\n").unwrap();

    let (config, provenance) = PressConfig::load_from_file_with_provenance(&path).unwrap();
    assert_eq!(config.advisor.rpm_step, 25.0);
    // Misspelled key is ignored, so the default stands
    assert_eq!(config.advisor.max_suggestions, 4);
    assert!(provenance.is_user_set("advisor.rpm_step"));
    assert!(!provenance.is_user_set("advisor.max_suggestions"));
}

#[test]
fn example_config_is_clean() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("press_config.example.toml");
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(validate_unknown_keys(&raw).is_empty());

    let config = PressConfig::load_from_file(&path).unwrap();
    assert_eq!(config.press.name, "Line-3 Forming Press");
    assert!(config.model_source.url.is_none());
    assert_eq!(config.limits.motor_rpm, PressConfig::default().limits.motor_rpm);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    match PressConfig::load_from_file(&path) {
        Err(ConfigError::Io(p, _)) => assert_eq!(p, path),
        other => panic!("expected I/O error, got {other:?}"),
    }
}
