//! Hospital real-time server library.
//! This crate exposes internal modules for integration testing.
//! The binary entry point is in main.rs.

pub mod admin;
pub mod biomedical;
pub mod config;
pub mod db;
pub mod pharmacy;
pub mod queue;
pub mod routes;
pub mod state;
pub mod triage;
pub mod vitals;
pub mod ws;
