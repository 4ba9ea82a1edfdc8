//! Pharmacy inventory. Every stock change is broadcast to all clinical
//! sockets so dashboards stay current without polling.

pub mod medicines;
