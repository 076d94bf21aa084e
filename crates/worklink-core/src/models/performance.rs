//! Student performance aggregates.

use serde::{Deserialize, Serialize};

/// Per-student counters, mutated only by lifecycle transitions and
/// application approval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentPerformance {
    pub student_id: String,
    pub assigned_count: i64,
    pub completed_count: i64,
    pub cancelled_count: i64,
    pub disputed_count: i64,
    pub on_time_count: i64,
    /// Whole rupees of verified payments.
    pub total_earnings: i64,
    pub updated_at: String,
}

impl StudentPerformance {
    /// Empty row for a student with no history yet.
    pub fn zero(student_id: &str, now: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            updated_at: now.to_string(),
            ..Default::default()
        }
    }

    /// Completed works as a percentage of assigned works, one decimal.
    pub fn completion_rate(&self) -> f64 {
        percentage(self.completed_count, self.assigned_count)
    }

    /// On-time deliveries as a percentage of completed works, one decimal.
    pub fn on_time_rate(&self) -> f64 {
        percentage(self.on_time_count, self.completed_count)
    }
}

fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / whole as f64).round() / 10.0
}
