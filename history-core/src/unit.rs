use std::{convert::TryFrom, fmt, str::FromStr};

use crate::error::HistoryError;

/// Unit system requested for returned weather values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl DataUnit {
    /// Short token accepted at construction time ("C", "F" or "K").
    pub fn token(&self) -> &'static str {
        match self {
            DataUnit::Celsius => "C",
            DataUnit::Fahrenheit => "F",
            DataUnit::Kelvin => "K",
        }
    }

    /// Value sent in the `units` query parameter.
    pub fn api_code(&self) -> &'static str {
        match self {
            DataUnit::Celsius => "metric",
            DataUnit::Fahrenheit => "imperial",
            DataUnit::Kelvin => "internal",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            DataUnit::Celsius => "°C",
            DataUnit::Fahrenheit => "°F",
            DataUnit::Kelvin => "K",
        }
    }

    pub const fn all() -> &'static [DataUnit] {
        &[DataUnit::Celsius, DataUnit::Fahrenheit, DataUnit::Kelvin]
    }

    /// Lookup used by the client constructor and the config file, which
    /// accept lowercase tokens. The error keeps the token as given.
    pub fn from_token_ignore_case(token: &str) -> Result<Self, HistoryError> {
        DataUnit::try_from(token.to_uppercase().as_str())
            .map_err(|_| HistoryError::UnitUnavailable(token.to_string()))
    }
}

/// Returns true if `token` is exactly one of "C", "F" or "K".
pub fn valid_data_unit(token: &str) -> bool {
    DataUnit::try_from(token).is_ok()
}

impl fmt::Display for DataUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl TryFrom<&str> for DataUnit {
    type Error = HistoryError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "C" => Ok(DataUnit::Celsius),
            "F" => Ok(DataUnit::Fahrenheit),
            "K" => Ok(DataUnit::Kelvin),
            _ => Err(HistoryError::UnitUnavailable(value.to_string())),
        }
    }
}

impl FromStr for DataUnit {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataUnit::try_from(s)
    }
}
