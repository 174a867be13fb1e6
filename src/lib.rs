//! MassLog: weekly weight averages, dashboard statistics and unit handling,
//! plus a small client for the Supabase project that stores the data.

pub mod admin;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod rest;
pub mod server;
pub mod stats;
pub mod units;
pub mod weekly;

pub use error::ValidationError;
pub use models::{DashboardStats, Measurement, NewWeight, UserProfile, WeekBucket, WeightSample};
pub use units::{UnitPreference, WeightUnit};
