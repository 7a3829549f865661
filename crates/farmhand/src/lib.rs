//! Booking lifecycle and matching engine for an agricultural labor marketplace.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;

pub use error::AppError;
