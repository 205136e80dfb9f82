//! Client library for the OpenWeatherMap historical weather API.
//!
//! This crate defines:
//! - The historical client and its construction options
//! - An injectable HTTP transport
//! - Request and response models
//! - Configuration & credentials handling
//!
//! It is used by `owm-history-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod transport;
pub mod unit;

pub use client::{ClientOption, DEFAULT_BASE_URL, HistoricalClient};
pub use config::Config;
pub use error::HistoryError;
pub use model::{Coordinates, HistoricalParameters, HistoricalWeatherData, WeatherHistory};
pub use transport::{HttpTransport, ReqwestTransport, TransportError, TransportResponse};
pub use unit::{DataUnit, valid_data_unit};
