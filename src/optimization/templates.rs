//! Slot-filled text for suggestions

use crate::types::{TargetMetric, TunableParameter};

/// Format a parameter value at the precision operators read it in.
pub fn format_value(parameter: TunableParameter, value: f64) -> String {
    match parameter {
        TunableParameter::MotorRpm => format!("{value:.0} rpm"),
        TunableParameter::PumpEfficiency => format!("{value:.3}"),
        TunableParameter::BoreCm | TunableParameter::RodCm => format!("{value:.2} cm"),
    }
}

/// Format a metric value with its unit.
pub fn format_metric(metric: TargetMetric, value: f64) -> String {
    match metric {
        TargetMetric::Pressure => format!("{value:.1} bar"),
        TargetMetric::Efficiency => format!("{value:.3}"),
        TargetMetric::CycleTime => format!("{value:.2} s"),
    }
}

/// Facts a reasoning sentence is built from.
pub struct ReasoningSlots {
    pub parameter: TunableParameter,
    pub metric: TargetMetric,
    pub goal_pct: f64,
    pub current_value: f64,
    pub suggested_value: f64,
    pub sensitivity: f64,
    pub clamped: bool,
    pub recommended: bool,
    pub recommended_band: (f64, f64),
}

/// Human-readable explanation of one suggestion.
pub fn reasoning(slots: &ReasoningSlots) -> String {
    let direction = if slots.suggested_value >= slots.current_value {
        "Increasing"
    } else {
        "Decreasing"
    };
    let goal_direction = if slots.goal_pct >= 0.0 { "raise" } else { "lower" };
    let per_unit = match slots.parameter {
        TunableParameter::MotorRpm => "rpm",
        TunableParameter::PumpEfficiency => "0.01 of efficiency",
        TunableParameter::BoreCm | TunableParameter::RodCm => "cm",
    };
    let rate = if slots.parameter == TunableParameter::PumpEfficiency {
        slots.sensitivity * 0.01
    } else {
        slots.sensitivity
    };

    let unit = match slots.metric.unit() {
        "" => String::new(),
        u => format!(" {u}"),
    };

    let mut parts = vec![format!(
        "{direction} {} from {} to {} to {goal_direction} {} by {:.1}%. \
         Each {per_unit} moves {} by {rate:+.4}{unit}.",
        slots.parameter.to_string().to_lowercase(),
        format_value(slots.parameter, slots.current_value),
        format_value(slots.parameter, slots.suggested_value),
        slots.metric,
        slots.goal_pct.abs(),
        slots.metric,
    )];

    if slots.clamped {
        parts.push(format!(
            "The full change exceeds the physical range, so the value is held at {}.",
            format_value(slots.parameter, slots.suggested_value)
        ));
    }
    if !slots.recommended {
        parts.push(format!(
            "This is outside the recommended operating band of {} to {}.",
            format_value(slots.parameter, slots.recommended_band.0),
            format_value(slots.parameter, slots.recommended_band.1)
        ));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_formatting() {
        assert_eq!(format_value(TunableParameter::MotorRpm, 1967.4), "1967 rpm");
        assert_eq!(format_value(TunableParameter::BoreCm, 3.0), "3.00 cm");
        assert_eq!(format_metric(TargetMetric::CycleTime, 9.876), "9.88 s");
    }

    #[test]
    fn test_reasoning_mentions_clamp_and_band() {
        let text = reasoning(&ReasoningSlots {
            parameter: TunableParameter::BoreCm,
            metric: TargetMetric::Pressure,
            goal_pct: 200.0,
            current_value: 6.5,
            suggested_value: 3.0,
            sensitivity: -10.35,
            clamped: true,
            recommended: true,
            recommended_band: (3.0, 8.5),
        });
        assert!(text.starts_with("Decreasing bore diameter from 6.50 cm to 3.00 cm"));
        assert!(text.contains("held at 3.00 cm"));
        assert!(!text.contains("recommended operating band"));
    }
}
