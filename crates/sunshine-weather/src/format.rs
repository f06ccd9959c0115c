use sunshine_core::TemperatureUnit;

/// Format a Celsius reading for display, e.g. `25°`.
///
/// Imperial converts to Fahrenheit first. Halves round away from zero and
/// `-0°` is printed as `0°`.
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    let value = match unit {
        TemperatureUnit::Metric => celsius,
        TemperatureUnit::Imperial => celsius * 1.8 + 32.0,
    };

    let mut rounded = value.round();
    if rounded == 0.0 {
        rounded = 0.0;
    }
    format!("{:.0}\u{00B0}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_whole_degrees() {
        assert_eq!(format_temperature(25.0, TemperatureUnit::Metric), "25°");
        assert_eq!(format_temperature(14.0, TemperatureUnit::Metric), "14°");
    }

    #[test]
    fn test_metric_rounds_half_away_from_zero() {
        assert_eq!(format_temperature(2.5, TemperatureUnit::Metric), "3°");
        assert_eq!(format_temperature(-2.5, TemperatureUnit::Metric), "-3°");
        assert_eq!(format_temperature(13.49, TemperatureUnit::Metric), "13°");
    }

    #[test]
    fn test_imperial_conversion() {
        assert_eq!(format_temperature(0.0, TemperatureUnit::Imperial), "32°");
        assert_eq!(format_temperature(100.0, TemperatureUnit::Imperial), "212°");
        assert_eq!(format_temperature(-40.0, TemperatureUnit::Imperial), "-40°");
    }

    #[test]
    fn test_no_negative_zero() {
        assert_eq!(format_temperature(-0.4, TemperatureUnit::Metric), "0°");
    }
}
