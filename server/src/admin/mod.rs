pub mod notify;
pub mod stats;
