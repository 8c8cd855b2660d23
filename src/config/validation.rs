//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

const BAND_FIELDS: [&str; 4] = ["physical_min", "physical_max", "recommended_min", "recommended_max"];
const LIMIT_SECTIONS: [&str; 4] = ["bore_cm", "rod_cm", "motor_rpm", "pump_efficiency"];

/// Returns the complete set of valid dotted key paths for PressConfig.
///
/// Maintained by hand to match the struct hierarchy in press_config.rs.
/// Any new field added to PressConfig must be added here too.
pub fn known_config_keys() -> HashSet<String> {
    let fixed: &[&str] = &[
        // [press]
        "press",
        "press.name",
        "press.description",
        // [simulation]
        "simulation",
        "simulation.relief_margin_percent",
        // [model_source]
        "model_source",
        "model_source.url",
        "model_source.artifact_path",
        "model_source.timeout_secs",
        "model_source.max_attempts",
        "model_source.base_backoff_ms",
        "model_source.max_backoff_ms",
        "model_source.jitter",
        "model_source.min_r_squared",
        "model_source.min_training_points",
        // [confidence]
        "confidence",
        "confidence.high_threshold",
        "confidence.medium_threshold",
        "confidence.weights",
        "confidence.weights.pressure",
        "confidence.weights.efficiency",
        "confidence.weights.cycle_time",
        // [advisor]
        "advisor",
        "advisor.max_suggestions",
        "advisor.rpm_step",
        "advisor.default_step",
        "advisor.min_sensitivity",
        // [limits]
        "limits",
        "limits.rod_clearance_cm",
    ];

    let mut keys: HashSet<String> = fixed.iter().map(|k| (*k).to_string()).collect();
    for section in LIMIT_SECTIONS {
        keys.insert(format!("limits.{section}"));
        for field in BAND_FIELDS {
            keys.insert(format!("limits.{section}.{field}"));
        }
    }
    keys
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

/// True if any float anywhere in the tree is NaN or infinite.
pub fn contains_non_finite(value: &toml::Value) -> bool {
    match value {
        toml::Value::Float(f) => !f.is_finite(),
        toml::Value::Array(items) => items.iter().any(contains_non_finite),
        toml::Value::Table(table) => table.values().any(contains_non_finite),
        _ => false,
    }
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<String>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.clone())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns. Existing configs
/// always continue to work.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed PressConfig.
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent use; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::PressConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let limits = &config.limits;

    // Geometry cannot be zero or negative
    if limits.bore_cm.physical_min <= 0.0 {
        errors.push(format!(
            "limits.bore_cm.physical_min = {:.2} must be > 0",
            limits.bore_cm.physical_min
        ));
    }
    if limits.rod_cm.physical_min <= 0.0 {
        errors.push(format!(
            "limits.rod_cm.physical_min = {:.2} must be > 0",
            limits.rod_cm.physical_min
        ));
    }

    // RPM: used as divisor for pump displacement
    if limits.motor_rpm.physical_min <= 0.0 {
        errors.push(format!(
            "limits.motor_rpm.physical_min = {:.0} must be > 0 (used as divisor)",
            limits.motor_rpm.physical_min
        ));
    }

    // Pump efficiency: a fraction, and used as divisor
    let eff = &limits.pump_efficiency;
    if eff.physical_min <= 0.0 || eff.physical_max > 1.0 {
        errors.push(format!(
            "limits.pump_efficiency = [{:.2}, {:.2}] is outside physical range (0-1]",
            eff.physical_min, eff.physical_max
        ));
    }

    // Timeout: the model service is expected to answer within 5-8 s
    let timeout = config.model_source.timeout_secs;
    if !(5..=8).contains(&timeout) {
        warnings.push(ValidationWarning {
            field: "model_source.timeout_secs".to_string(),
            message: format!("model_source.timeout_secs = {timeout} is outside typical range (5-8 s)"),
            suggestion: None,
        });
    }

    // Relief margin: above 50% the valve no longer protects the circuit
    let margin = config.simulation.relief_margin_percent;
    if margin > 50.0 {
        warnings.push(ValidationWarning {
            field: "simulation.relief_margin_percent".to_string(),
            message: format!("simulation.relief_margin_percent = {margin:.1} is unusually high (> 50%)"),
            suggestion: None,
        });
    }

    // Quality gate: below 0.5 the remote model barely explains the data
    let r2 = config.model_source.min_r_squared;
    if r2 < 0.5 {
        warnings.push(ValidationWarning {
            field: "model_source.min_r_squared".to_string(),
            message: format!("model_source.min_r_squared = {r2:.2} accepts very weak models"),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("max_atempts", "max_attempts"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [limits]
            [limits.bore_cm]
            physical_min = 3.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"limits".to_string()));
        assert!(keys.contains(&"limits.bore_cm".to_string()));
        assert!(keys.contains(&"limits.bore_cm.physical_min".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[model_source]
max_atempts = 5
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].field.contains("max_atempts"));
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("model_source.max_attempts")
        );
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[press]
name = "Line-3"

[model_source]
url = "http://localhost:8080/coefficients"

[confidence.weights]
pressure = 0.4

[limits.motor_rpm]
recommended_max = 2800.0
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {warnings:?}");
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        let suggestion = suggest_correction("completely_unrelated_garbage_key_xyz", &known);
        assert!(suggestion.is_none());
    }

    #[test]
    fn test_known_keys_cover_every_limit_band() {
        let known = known_config_keys();
        for section in LIMIT_SECTIONS {
            for field in BAND_FIELDS {
                assert!(known.contains(&format!("limits.{section}.{field}")));
            }
        }
    }

    #[test]
    fn test_contains_non_finite() {
        let mut table = toml::map::Map::new();
        table.insert("a".to_string(), toml::Value::Float(1.0));
        assert!(!contains_non_finite(&toml::Value::Table(table.clone())));
        table.insert("b".to_string(), toml::Value::Float(f64::NAN));
        assert!(contains_non_finite(&toml::Value::Table(table)));
    }

    #[test]
    fn test_physical_range_defaults_clean() {
        let config = crate::config::PressConfig::default();
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty(), "Defaults should produce no errors: {errors:?}");
        assert!(warnings.is_empty(), "Defaults should produce no warnings: {warnings:?}");
    }

    #[test]
    fn test_physical_range_efficiency_above_one() {
        let mut config = crate::config::PressConfig::default();
        config.limits.pump_efficiency.physical_max = 1.2;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("pump_efficiency")));
    }

    #[test]
    fn test_physical_range_timeout_suspicious() {
        let mut config = crate::config::PressConfig::default();
        config.model_source.timeout_secs = 60;
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.field == "model_source.timeout_secs"));
    }
}
