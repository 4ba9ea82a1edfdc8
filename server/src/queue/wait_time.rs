//! Queue position and wait estimates for one doctor's queue.

use crate::db::models::QueueEntry;
use crate::ws::events::WaitTimeUpdate;

/// Position and estimated wait for every active entry, in arrival order.
/// `entries` must already be sorted by arrival; inactive entries are skipped.
/// Everyone still active ahead of a patient costs one consultation.
pub fn estimate_waits(entries: &[QueueEntry], avg_consultation_minutes: u32) -> Vec<WaitTimeUpdate> {
    entries
        .iter()
        .filter(|e| e.status.is_active())
        .enumerate()
        .map(|(ahead, entry)| {
            let ahead = ahead as u32;
            WaitTimeUpdate {
                queue_entry_id: entry.id.clone(),
                doctor_id: entry.doctor_id.clone(),
                position: ahead + 1,
                estimated_wait_minutes: ahead.saturating_mul(avg_consultation_minutes),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::QueueStatus;

    fn entry(id: &str, status: QueueStatus) -> QueueEntry {
        QueueEntry {
            id: id.to_string(),
            patient_id: format!("patient-{}", id),
            doctor_id: "d1".to_string(),
            status,
            destination: None,
            instructions: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_positions_count_active_entries_ahead() {
        let entries = vec![
            entry("a", QueueStatus::InConsultation),
            entry("b", QueueStatus::Waiting),
            entry("c", QueueStatus::Waiting),
        ];
        let waits = estimate_waits(&entries, 15);
        let summary: Vec<(&str, u32, u32)> = waits
            .iter()
            .map(|w| (w.queue_entry_id.as_str(), w.position, w.estimated_wait_minutes))
            .collect();
        assert_eq!(summary, vec![("a", 1, 0), ("b", 2, 15), ("c", 3, 30)]);
    }

    #[test]
    fn test_finished_entries_do_not_hold_a_place() {
        let entries = vec![
            entry("a", QueueStatus::Completed),
            entry("b", QueueStatus::Cancelled),
            entry("c", QueueStatus::Waiting),
        ];
        let waits = estimate_waits(&entries, 10);
        assert_eq!(waits.len(), 1);
        assert_eq!(waits[0].position, 1);
        assert_eq!(waits[0].estimated_wait_minutes, 0);
    }

    #[test]
    fn test_empty_queue() {
        assert!(estimate_waits(&[], 15).is_empty());
    }
}
