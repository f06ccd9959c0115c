use serde::{Deserialize, Serialize};

/// Icon categories shown next to the temperatures on the watch face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIcon {
    Storm,
    LightRain,
    Rain,
    Snow,
    Fog,
    Clear,
    LightClouds,
    Clouds,
}

impl WeatherIcon {
    /// Every icon, in mapping order.
    pub const ALL: [WeatherIcon; 8] = [
        Self::Storm,
        Self::LightRain,
        Self::Rain,
        Self::Snow,
        Self::Fog,
        Self::Clear,
        Self::LightClouds,
        Self::Clouds,
    ];

    /// Resolve an OpenWeatherMap condition code to an icon.
    /// See: https://openweathermap.org/weather-conditions
    ///
    /// Returns `None` for codes outside every known range; callers draw no icon.
    pub fn from_condition_code(code: i32) -> Option<Self> {
        match code {
            200..=232 => Some(Self::Storm),
            300..=321 => Some(Self::LightRain),
            500..=504 => Some(Self::Rain),
            511 => Some(Self::Snow), // Freezing rain
            520..=531 => Some(Self::Rain),
            600..=622 => Some(Self::Snow),
            701..=761 => Some(Self::Fog),
            781 => Some(Self::Storm), // Tornado
            800 => Some(Self::Clear),
            801 => Some(Self::LightClouds),
            802..=804 => Some(Self::Clouds),
            _ => None,
        }
    }

    /// Name of the bitmap asset on the wearable
    pub fn asset_name(&self) -> &'static str {
        match self {
            Self::Storm => "art_storm",
            Self::LightRain => "art_light_rain",
            Self::Rain => "art_rain",
            Self::Snow => "art_snow",
            Self::Fog => "art_fog",
            Self::Clear => "art_clear",
            Self::LightClouds => "art_light_clouds",
            Self::Clouds => "art_clouds",
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Storm => "Storm",
            Self::LightRain => "Light Rain",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Fog => "Fog",
            Self::Clear => "Clear",
            Self::LightClouds => "Light Clouds",
            Self::Clouds => "Clouds",
        }
    }
}

/// Formatted forecast carried from the phone to the watch.
///
/// Temperatures are already formatted on the phone so the watch never
/// needs to know the user's unit preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub high: String,
    pub low: String,
    #[serde(rename = "weatherId")]
    pub condition_code: i32,
}

impl WeatherSummary {
    pub fn new(high: impl Into<String>, low: impl Into<String>, condition_code: i32) -> Self {
        Self {
            high: high.into(),
            low: low.into(),
            condition_code,
        }
    }

    pub fn icon(&self) -> Option<WeatherIcon> {
        WeatherIcon::from_condition_code(self.condition_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storm_range() {
        assert_eq!(WeatherIcon::from_condition_code(200), Some(WeatherIcon::Storm));
        assert_eq!(WeatherIcon::from_condition_code(232), Some(WeatherIcon::Storm));
        assert_eq!(WeatherIcon::from_condition_code(781), Some(WeatherIcon::Storm));
    }

    #[test]
    fn test_drizzle_is_light_rain() {
        assert_eq!(WeatherIcon::from_condition_code(300), Some(WeatherIcon::LightRain));
        assert_eq!(WeatherIcon::from_condition_code(321), Some(WeatherIcon::LightRain));
    }

    #[test]
    fn test_rain_ranges() {
        assert_eq!(WeatherIcon::from_condition_code(500), Some(WeatherIcon::Rain));
        assert_eq!(WeatherIcon::from_condition_code(504), Some(WeatherIcon::Rain));
        assert_eq!(WeatherIcon::from_condition_code(520), Some(WeatherIcon::Rain));
        assert_eq!(WeatherIcon::from_condition_code(531), Some(WeatherIcon::Rain));
    }

    #[test]
    fn test_snow_codes() {
        assert_eq!(WeatherIcon::from_condition_code(511), Some(WeatherIcon::Snow));
        assert_eq!(WeatherIcon::from_condition_code(600), Some(WeatherIcon::Snow));
        assert_eq!(WeatherIcon::from_condition_code(622), Some(WeatherIcon::Snow));
    }

    #[test]
    fn test_atmosphere_is_fog() {
        assert_eq!(WeatherIcon::from_condition_code(701), Some(WeatherIcon::Fog));
        // 761 (dust) sits inside the fog range and resolves there first
        assert_eq!(WeatherIcon::from_condition_code(761), Some(WeatherIcon::Fog));
    }

    #[test]
    fn test_clear_and_clouds() {
        assert_eq!(WeatherIcon::from_condition_code(800), Some(WeatherIcon::Clear));
        assert_eq!(WeatherIcon::from_condition_code(801), Some(WeatherIcon::LightClouds));
        assert_eq!(WeatherIcon::from_condition_code(802), Some(WeatherIcon::Clouds));
        assert_eq!(WeatherIcon::from_condition_code(804), Some(WeatherIcon::Clouds));
    }

    #[test]
    fn test_gaps_between_ranges_have_no_icon() {
        let unmapped = [
            0, 199, 233, 299, 322, 505, 510, 512, 519, 532, 599, 623, 700, 762, 780, 782, 799,
            805, 999, -1,
        ];
        for code in unmapped {
            assert_eq!(WeatherIcon::from_condition_code(code), None, "code {}", code);
        }
    }

    #[test]
    fn test_every_icon_is_reachable() {
        let reachable: std::collections::HashSet<_> = (0..1000)
            .filter_map(WeatherIcon::from_condition_code)
            .collect();
        for icon in WeatherIcon::ALL {
            assert!(reachable.contains(&icon), "{:?} has no code", icon);
        }
    }

    #[test]
    fn test_asset_names() {
        assert_eq!(WeatherIcon::Storm.asset_name(), "art_storm");
        assert_eq!(WeatherIcon::LightClouds.asset_name(), "art_light_clouds");
    }

    #[test]
    fn test_summary_icon() {
        let summary = WeatherSummary::new("25°", "14°", 200);
        assert_eq!(summary.icon(), Some(WeatherIcon::Storm));
        assert_eq!(WeatherSummary::new("1°", "0°", 999).icon(), None);
    }

    #[test]
    fn test_summary_uses_wire_key_for_condition() {
        let json = serde_json::to_value(WeatherSummary::new("25°", "14°", 200)).unwrap();
        assert_eq!(json["weatherId"], 200);
        assert_eq!(json["high"], "25°");
    }
}
