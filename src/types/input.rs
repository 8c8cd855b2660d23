//! Press input parameters and their preconditions

use serde::{Deserialize, Serialize};

// ============================================================================
// Input Model
// ============================================================================

/// Physical parameters describing one press configuration.
///
/// Immutable for the duration of a simulation or prediction call. All fields
/// must be finite and positive, `pump_efficiency` must lie in `(0, 1]`, and the
/// rod must be thinner than the bore (`rod_cm < bore_cm`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputModel {
    /// Cylinder bore diameter (cm)
    pub bore_cm: f64,
    /// Piston rod diameter (cm)
    pub rod_cm: f64,
    /// Load carried during fast strokes (metric ton)
    pub dead_load_ton: f64,
    /// Load held during the working and holding phases (metric ton)
    pub holding_load_ton: f64,
    /// Pump drive motor speed (rev/min)
    pub motor_rpm: f64,
    /// Volumetric/mechanical pump efficiency (0–1)
    pub pump_efficiency: f64,
    /// Line and valve losses added on top of load pressure (bar)
    pub system_loss_bar: f64,
}

impl Default for InputModel {
    /// A mid-size 10-ton forming press.
    fn default() -> Self {
        Self {
            bore_cm: 6.5,
            rod_cm: 3.0,
            dead_load_ton: 2.0,
            holding_load_ton: 8.0,
            motor_rpm: 1500.0,
            pump_efficiency: 0.9,
            system_loss_bar: 5.0,
        }
    }
}

/// Precondition violations on [`InputModel`].
///
/// These are fatal to the call: the simulator and the advisor reject the
/// input rather than coercing it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("invalid geometry: rod diameter {rod_cm} cm must be smaller than bore diameter {bore_cm} cm")]
    InvalidGeometry { bore_cm: f64, rod_cm: f64 },

    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("pump efficiency must not exceed 1.0 (got {0})")]
    EfficiencyAboveUnity(f64),
}

impl InputModel {
    /// Field name/value pairs in declaration order.
    pub fn fields(&self) -> [(&'static str, f64); 7] {
        [
            ("boreCm", self.bore_cm),
            ("rodCm", self.rod_cm),
            ("deadLoadTon", self.dead_load_ton),
            ("holdingLoadTon", self.holding_load_ton),
            ("motorRpm", self.motor_rpm),
            ("pumpEfficiency", self.pump_efficiency),
            ("systemLossBar", self.system_loss_bar),
        ]
    }

    /// Check every precondition the simulator and the model rely on.
    pub fn validate(&self) -> Result<(), InputError> {
        for (field, value) in self.fields() {
            if !value.is_finite() {
                return Err(InputError::NonFinite { field });
            }
            if value <= 0.0 {
                return Err(InputError::NonPositive { field, value });
            }
        }

        if self.pump_efficiency > 1.0 {
            return Err(InputError::EfficiencyAboveUnity(self.pump_efficiency));
        }

        if self.rod_cm >= self.bore_cm {
            return Err(InputError::InvalidGeometry {
                bore_cm: self.bore_cm,
                rod_cm: self.rod_cm,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_input_is_valid() {
        assert!(InputModel::default().validate().is_ok());
    }

    #[test]
    fn test_rod_equal_to_bore_rejected() {
        let input = InputModel {
            rod_cm: 6.5,
            ..Default::default()
        };
        assert!(matches!(
            input.validate(),
            Err(InputError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_zero_rpm_rejected() {
        let input = InputModel {
            motor_rpm: 0.0,
            ..Default::default()
        };
        assert_eq!(
            input.validate(),
            Err(InputError::NonPositive { field: "motorRpm", value: 0.0 })
        );
    }

    #[test]
    fn test_nan_rejected() {
        let input = InputModel {
            dead_load_ton: f64::NAN,
            ..Default::default()
        };
        assert_eq!(
            input.validate(),
            Err(InputError::NonFinite { field: "deadLoadTon" })
        );
    }

    #[test]
    fn test_efficiency_above_one_rejected() {
        let input = InputModel {
            pump_efficiency: 1.2,
            ..Default::default()
        };
        assert!(matches!(input.validate(), Err(InputError::EfficiencyAboveUnity(_))));
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = serde_json::to_value(InputModel::default()).unwrap();
        assert_eq!(json["boreCm"], 6.5);
        assert_eq!(json["pumpEfficiency"], 0.9);
    }
}
