use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Geographic point used by coordinate queries.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Time window for a historical query.
///
/// `start` and `end` are Unix seconds (UTC). `cnt` caps the number of hourly
/// samples returned and can be used in place of `end`. The window is sent as
/// given; no ordering between `start` and `end` is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoricalParameters {
    pub start: i64,
    pub end: i64,
    pub cnt: Option<u32>,
}

impl HistoricalParameters {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end, cnt: None }
    }

    pub fn with_cnt(mut self, cnt: u32) -> Self {
        self.cnt = Some(cnt);
        self
    }

    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("type", "hour".to_string()),
            ("start", self.start.to_string()),
            ("end", self.end.to_string()),
        ];
        if let Some(cnt) = self.cnt {
            pairs.push(("cnt", cnt.to_string()));
        }
        pairs
    }
}

/// Decoded body of a history request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoricalWeatherData {
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub cod: String,
    #[serde(default)]
    pub city_id: i64,
    #[serde(default)]
    pub calctime: f64,
    #[serde(default)]
    pub cnt: u32,
    pub list: Vec<WeatherHistory>,
}

impl HistoricalWeatherData {
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// True unless the service reported a code other than 200.
    pub fn is_ok_code(&self) -> bool {
        self.cod.is_empty() || self.cod == "200"
    }
}

/// One hourly observation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherHistory {
    pub dt: i64,
    #[serde(default)]
    pub main: MainConditions,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub clouds: Clouds,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain: Option<Precipitation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snow: Option<Precipitation>,
}

impl WeatherHistory {
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.dt, 0)
    }

    /// Description of the first reported condition.
    pub fn condition(&self) -> &str {
        self.weather.first().map(|w| w.description.as_str()).unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MainConditions {
    #[serde(default)]
    pub temp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub temp_min: f64,
    #[serde(default)]
    pub temp_max: f64,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Clouds {
    #[serde(default)]
    pub all: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Condition {
    pub id: u32,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

/// Precipitation volume in mm.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Precipitation {
    #[serde(rename = "1h", default, skip_serializing_if = "Option::is_none")]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h", default, skip_serializing_if = "Option::is_none")]
    pub three_hours: Option<f64>,
}

// The history endpoint sends `cod` as a string, other endpoints as a number.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Number(i64),
    }

    Ok(match Code::deserialize(deserializer)? {
        Code::Text(s) => s,
        Code::Number(n) => n.to_string(),
    })
}
