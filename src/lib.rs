//! Spreadsheet filtering, plotting and trend extrapolation.
//!
//! [`service::Daplot`] is the entry point: it owns the in-memory
//! [`data::store::TableStore`] and exposes filter, plot projection,
//! prediction and save operations over stored tables.

pub mod config;
pub mod data;
pub mod error;
pub mod predict;
pub mod service;

pub use config::AppConfig;
pub use error::{DaplotError, Result};
pub use service::Daplot;
