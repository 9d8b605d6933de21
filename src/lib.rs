//! shelter-locator - Find the nearest emergency shelter and walk there

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod map;
pub mod region;
