//! AQI → alert tier tables.
//!
//! Two independently maintained tables: the fine five-tier one attached
//! to every prediction, and the coarse two-tier one served by the alert
//! endpoint. They bucket differently on purpose (`<=` vs strict `>`) and
//! must not be unified.

use common::AlertStatus;

/// Five-tier message attached to the prediction response.
pub fn fine_alert(aqi: f64) -> &'static str {
    if aqi <= 50.0 {
        "Good air quality, enjoy your day!"
    } else if aqi <= 100.0 {
        "Moderate air quality, sensitive groups should reduce outdoor exertion."
    } else if aqi <= 150.0 {
        "Poor quality, avoid prolonged efforts outdoors."
    } else if aqi <= 200.0 {
        "Very poor quality, stay indoors"
    } else {
        "Dangerous air, protect yourself seriously"
    }
}

/// Two-tier classification for the alert endpoint.
pub fn coarse_alert(aqi: f64) -> AlertStatus {
    if aqi > 150.0 {
        AlertStatus {
            alert: true,
            level: Some("Unhealthy".to_string()),
            message: Some("Avoid outdoor activity".to_string()),
        }
    } else if aqi > 100.0 {
        AlertStatus {
            alert: true,
            level: Some("Moderate".to_string()),
            message: Some("Consider reducing outdoor exercise".to_string()),
        }
    } else {
        AlertStatus {
            alert: false,
            level: None,
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fine_tier_boundaries() {
        assert!(fine_alert(50.0).starts_with("Good"));
        assert!(fine_alert(50.01).starts_with("Moderate"));
        assert!(fine_alert(100.0).starts_with("Moderate"));
        assert!(fine_alert(100.01).starts_with("Poor"));
        assert!(fine_alert(150.0).starts_with("Poor"));
        assert!(fine_alert(200.0).starts_with("Very poor"));
        assert!(fine_alert(200.01).starts_with("Dangerous"));
    }

    #[test]
    fn test_fine_is_total_over_the_real_line() {
        assert!(fine_alert(-12.0).starts_with("Good"));
        assert!(fine_alert(f64::MAX).starts_with("Dangerous"));
        // NaN fails every <= comparison and lands in the last tier.
        assert!(fine_alert(f64::NAN).starts_with("Dangerous"));
    }

    #[test]
    fn test_coarse_tier_boundaries() {
        assert!(!coarse_alert(100.0).alert);
        assert!(!coarse_alert(-5.0).alert);

        let moderate = coarse_alert(100.5);
        assert!(moderate.alert);
        assert_eq!(moderate.level.as_deref(), Some("Moderate"));
        assert_eq!(
            moderate.message.as_deref(),
            Some("Consider reducing outdoor exercise")
        );

        assert_eq!(coarse_alert(150.0).level.as_deref(), Some("Moderate"));

        let unhealthy = coarse_alert(150.5);
        assert!(unhealthy.alert);
        assert_eq!(unhealthy.level.as_deref(), Some("Unhealthy"));
        assert_eq!(unhealthy.message.as_deref(), Some("Avoid outdoor activity"));
    }
}
