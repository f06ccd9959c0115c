//! Wire schema for the weather record.
//!
//! The schema is implicit: both ends must agree on the path and keys below.

use sunshine_core::SyncError;
use sunshine_weather::WeatherSummary;

use crate::record::{DataItem, PutDataRequest};

pub const WEATHER_PATH: &str = "/weather";
pub const KEY_HIGH: &str = "high";
pub const KEY_LOW: &str = "low";
pub const KEY_WEATHER_ID: &str = "weatherId";

pub fn encode_weather(summary: &WeatherSummary) -> PutDataRequest {
    let mut request = PutDataRequest::create(WEATHER_PATH);
    let map = request.data_map_mut();
    map.put_string(KEY_HIGH, summary.high.clone());
    map.put_string(KEY_LOW, summary.low.clone());
    map.put_int(KEY_WEATHER_ID, summary.condition_code);
    request
}

/// Decode a weather record.
///
/// Both temperatures are required. A missing condition code reads as 0,
/// which maps to no icon.
pub fn decode_weather(item: &DataItem) -> Result<WeatherSummary, SyncError> {
    if item.path != WEATHER_PATH {
        return Err(SyncError::decode(
            &item.path,
            format!("expected path {}", WEATHER_PATH),
        ));
    }

    let map = item.data_map()?;
    let high = map
        .get_string(KEY_HIGH)
        .ok_or_else(|| SyncError::decode(&item.path, format!("missing key: {}", KEY_HIGH)))?;
    let low = map
        .get_string(KEY_LOW)
        .ok_or_else(|| SyncError::decode(&item.path, format!("missing key: {}", KEY_LOW)))?;
    let condition_code = map.get_int(KEY_WEATHER_ID).unwrap_or(0);

    Ok(WeatherSummary::new(high, low, condition_code))
}
