//! Vitals capture. Every stored reading carries the triage colour assigned
//! at capture time.

pub mod routes;
