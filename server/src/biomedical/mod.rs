//! Biomedical engineering: equipment status, medical waste tracking and
//! collection tasks. Pushes go through the biomedical registry only.

pub mod equipment;
pub mod tasks;
pub mod waste;
