use crate::database::connection::Database;
use crate::database::models::{AnsweredJob, JobRecord};
use anyhow::Result;
use chrono::Utc;
use rusqlite::params;

impl Database {
    /// Queue a job for an account's worker
    pub fn create_job(&self, account_id: i64, name: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO jobs (account_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![account_id, name, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Worker-side completion: attach the JSON answer payload
    pub fn set_job_answer(&self, id: i64, answer: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE jobs SET answer = ?1 WHERE id = ?2",
            params![answer, id],
        )?;
        Ok(())
    }

    /// Answered jobs joined with the accounts that own them, oldest first
    pub fn fetch_answered_jobs(&self) -> Result<Vec<AnsweredJob>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT j.id, j.account_id, j.name, j.answer, a.name, a.phone, a.user_id
             FROM jobs j JOIN accounts a ON a.id = j.account_id
             WHERE j.answer IS NOT NULL
             ORDER BY j.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AnsweredJob {
                job: JobRecord {
                    id: row.get(0)?,
                    account_id: row.get(1)?,
                    name: row.get(2)?,
                    answer: row.get(3)?,
                },
                account_name: row.get(4)?,
                account_phone: row.get(5)?,
                owner_user_id: row.get(6)?,
            })
        })?;
        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row?);
        }
        Ok(jobs)
    }

    pub fn delete_job(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(db: &Database) -> i64 {
        db.create_account(
            42,
            "alpha",
            "79990001122",
            1,
            "0123456789abcdef0123456789abcdef",
            "/s/79990001122.session",
        )
        .unwrap()
    }

    #[test]
    fn answered_jobs_surface_with_their_owner() {
        let db = Database::open_in_memory().unwrap();
        let acc = account(&db);
        let pending = db.create_job(acc, "collect_dialogs").unwrap();
        let answered = db.create_job(acc, "send_batch").unwrap();
        db.set_job_answer(answered, r#"{"sent": 7}"#).unwrap();

        let jobs = db.fetch_answered_jobs().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job.id, answered);
        assert_eq!(jobs[0].job.answer.as_deref(), Some(r#"{"sent": 7}"#));
        assert_eq!(jobs[0].owner_user_id, 42);
        assert_eq!(jobs[0].account_phone, "79990001122");

        db.delete_job(answered).unwrap();
        db.delete_job(pending).unwrap();
        assert!(db.fetch_answered_jobs().unwrap().is_empty());
    }

    #[test]
    fn queued_name_collection_waits_for_the_worker() {
        // The console queues this job from the account menu; it must stay
        // invisible to the forwarder until a worker writes the answer.
        let db = Database::open_in_memory().unwrap();
        let acc = account(&db);
        let job = db.create_job(acc, crate::jobs::GET_NAMES_JOB).unwrap();
        assert!(db.fetch_answered_jobs().unwrap().is_empty());

        db.set_job_answer(job, r#"{"names": 3}"#).unwrap();
        let jobs = db.fetch_answered_jobs().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job.name, crate::jobs::GET_NAMES_JOB);
    }
}
