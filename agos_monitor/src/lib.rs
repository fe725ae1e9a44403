//! Agos: client for a water-level monitoring service.
//!
//! Shows gauge devices from a hosted table store as map markers and
//! registers new devices. The store owns all data; this crate holds
//! read-only snapshots and performs two calls against it.

pub mod config;
pub mod demo;
pub mod form;
pub mod gauges;
pub mod location;
pub mod logging;
pub mod markers;
pub mod model;
pub mod screens;
pub mod store;
pub mod verify;
