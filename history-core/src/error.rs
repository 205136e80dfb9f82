use thiserror::Error;

use crate::transport::TransportError;

/// Errors returned by [`HistoricalClient`](crate::HistoricalClient).
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Unknown unit '{0}'. Supported units: C, F, K.")]
    UnitUnavailable(String),

    #[error("No API key provided")]
    MissingApiKey,

    #[error("Invalid HTTP transport: an explicit transport option must not be empty")]
    InvalidTransport,

    #[error("Failed to configure the default HTTP transport")]
    TransportConfig(#[source] TransportError),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Location name must not be empty")]
    EmptyLocation,

    #[error("Request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("OpenWeather history request failed with status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("OpenWeather history request returned code {cod}: {message}")]
    Service { cod: String, message: String },

    #[error("Failed to parse OpenWeather history JSON")]
    Decode(#[source] serde_json::Error),
}
