//! Outpatient queue: check-in, status changes, in-hospital navigation and the
//! wait-time pushes that follow each change.

pub mod routes;
pub mod wait_time;
