//! Student performance store.
//!
//! Counter bumps happen inside workflow transactions; this store serves
//! reads and the leaderboard query.

use super::{lock_conn, now_rfc3339};
use crate::config::ReportsConfig;
use crate::models::StudentPerformance;
use crate::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const PERFORMANCE_COLUMNS: &str =
    "student_id, assigned_count, completed_count, cancelled_count, disputed_count, \
     on_time_count, total_earnings, updated_at";

pub struct PerformanceStore {
    conn: Arc<Mutex<Connection>>,
}

impl PerformanceStore {
    pub fn new(db: &super::Database) -> Self {
        Self { conn: db.handle() }
    }

    /// Read a student's counters. A missing row reads as all-zero.
    pub fn get(&self, student_id: &str) -> Result<StudentPerformance> {
        let conn = lock_conn(&self.conn)?;
        let result = conn
            .query_row(
                &format!(
                    "SELECT {} FROM student_performance WHERE student_id = ?1",
                    PERFORMANCE_COLUMNS
                ),
                params![student_id],
                row_to_performance,
            )
            .optional()?;
        Ok(result.unwrap_or_else(|| StudentPerformance::zero(student_id, &now_rfc3339())))
    }

    /// Students ranked by completion rate then earnings, with a minimum
    /// assignment floor so one lucky work does not top the board.
    pub fn top_students(&self, limit: usize) -> Result<Vec<StudentPerformance>> {
        let conn = lock_conn(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM student_performance
             WHERE assigned_count >= ?1
             ORDER BY (CAST(completed_count AS REAL) / assigned_count) DESC,
                      total_earnings DESC
             LIMIT ?2",
            PERFORMANCE_COLUMNS
        ))?;
        let rows: Vec<StudentPerformance> = stmt
            .query_map(
                params![ReportsConfig::LEADERBOARD_MIN_ASSIGNED, limit as i64],
                row_to_performance,
            )?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }
}

fn row_to_performance(row: &Row<'_>) -> rusqlite::Result<StudentPerformance> {
    Ok(StudentPerformance {
        student_id: row.get(0)?,
        assigned_count: row.get(1)?,
        completed_count: row.get(2)?,
        cancelled_count: row.get(3)?,
        disputed_count: row.get(4)?,
        on_time_count: row.get(5)?,
        total_earnings: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;

    fn seed(db: &Database, student: &str, assigned: i64, completed: i64, earnings: i64) {
        db.lock()
            .unwrap()
            .execute(
                "INSERT INTO student_performance
                     (student_id, assigned_count, completed_count, total_earnings, updated_at)
                 VALUES (?1, ?2, ?3, ?4, '2024-01-01T00:00:00Z')",
                params![student, assigned, completed, earnings],
            )
            .unwrap();
    }

    #[test]
    fn test_missing_row_reads_as_zero() {
        let db = Database::open_in_memory().unwrap();
        let store = PerformanceStore::new(&db);

        let perf = store.get("nobody").unwrap();
        assert_eq!(perf.student_id, "nobody");
        assert_eq!(perf.assigned_count, 0);
        assert_eq!(perf.completion_rate(), 0.0);
    }

    #[test]
    fn test_top_students_ordering_and_floor() {
        let db = Database::open_in_memory().unwrap();
        let store = PerformanceStore::new(&db);

        seed(&db, "perfect-but-new", 1, 1, 10_000); // below the floor
        seed(&db, "steady", 10, 9, 40_000);
        seed(&db, "rich-but-flaky", 10, 5, 90_000);
        seed(&db, "tie-breaker", 10, 9, 50_000);

        let top = store.top_students(10).unwrap();
        let ids: Vec<_> = top.iter().map(|p| p.student_id.as_str()).collect();

        assert_eq!(ids, vec!["tie-breaker", "steady", "rich-but-flaky"]);
    }

    #[test]
    fn test_top_students_respects_limit() {
        let db = Database::open_in_memory().unwrap();
        let store = PerformanceStore::new(&db);

        seed(&db, "a", 5, 5, 1);
        seed(&db, "b", 5, 4, 1);
        seed(&db, "c", 5, 3, 1);

        let top = store.top_students(2).unwrap();
        assert_eq!(top.len(), 2);
    }
}
