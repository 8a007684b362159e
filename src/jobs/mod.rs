//! Job answer forwarder
//!
//! Workers complete jobs by writing a JSON answer into the jobs table; this
//! service polls for answered jobs, delivers each answer to the owning
//! admin's chat and removes the row. Delivery failures keep the row so the
//! next cycle retries.

use crate::config::with_config;
use crate::database::{AnsweredJob, Database};
use crate::logger::{self, LogTag};
use crate::services::Service;
use crate::telegram;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Job name for collecting dialog names and usernames from a worker
///
/// The console queues jobs by name only; workers watch the jobs table and
/// recognize the ones they know how to run.
pub const GET_NAMES_JOB: &str = "get_names_and_usernames";

pub struct JobAnswerService {
    db: Database,
}

impl JobAnswerService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Service for JobAnswerService {
    fn name(&self) -> &'static str {
        "job_answers"
    }

    fn priority(&self) -> i32 {
        50
    }

    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
        let db = self.db.clone();
        let interval = Duration::from_secs(with_config(|c| c.jobs.poll_interval_secs));

        let handle = tokio::spawn(async move {
            logger::info(LogTag::Jobs, "Job answer polling started");

            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        logger::info(LogTag::Jobs, "Job answer polling received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        deliver_pending(&db).await;
                    }
                }
            }

            logger::info(LogTag::Jobs, "Job answer polling stopped");
        });

        Ok(vec![handle])
    }
}

/// One delivery pass over the answered jobs
async fn deliver_pending(db: &Database) {
    let jobs = match db.fetch_answered_jobs() {
        Ok(jobs) => jobs,
        Err(e) => {
            logger::error(LogTag::Jobs, &format!("Failed to fetch answered jobs: {}", e));
            return;
        }
    };

    for job in jobs {
        let message = format_answer(&job);
        match telegram::send_message(job.owner_user_id, &message).await {
            Ok(()) => {
                if let Err(e) = db.delete_job(job.job.id) {
                    logger::error(
                        LogTag::Jobs,
                        &format!("Failed to remove delivered job {}: {}", job.job.id, e),
                    );
                }
                logger::debug(
                    LogTag::Jobs,
                    &format!("Delivered answer for job {} ({})", job.job.id, job.job.name),
                );
            }
            Err(e) => {
                // Keep the row; retried next cycle.
                logger::warning(
                    LogTag::Jobs,
                    &format!("Failed to deliver job {} answer: {}", job.job.id, e),
                );
            }
        }
    }
}

/// Render a worker's JSON answer for the owner's chat
fn format_answer(job: &AnsweredJob) -> String {
    let raw = job.job.answer.as_deref().unwrap_or("{}");
    let details = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => {
            let mut lines = Vec::new();
            for (key, value) in &map {
                lines.push(format!("{}: {}", key, value));
            }
            lines.join("\n")
        }
        _ => raw.to_string(),
    };

    format!(
        "📬 <b>{}</b> finished on {} ({})\n\n{}",
        telegram::bot::html_escape(&job.job.name),
        telegram::bot::html_escape(&job.account_name),
        job.account_phone,
        telegram::bot::html_escape(&details)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::JobRecord;

    fn answered(answer: &str) -> AnsweredJob {
        AnsweredJob {
            job: JobRecord {
                id: 1,
                account_id: 2,
                name: "send_batch".to_string(),
                answer: Some(answer.to_string()),
            },
            account_name: "alpha".to_string(),
            account_phone: "79990001122".to_string(),
            owner_user_id: 42,
        }
    }

    #[test]
    fn json_answers_render_as_key_value_lines() {
        let msg = format_answer(&answered(r#"{"sent": 7, "failed": 1}"#));
        assert!(msg.contains("send_batch"));
        assert!(msg.contains("sent: 7"));
        assert!(msg.contains("failed: 1"));
        assert!(msg.contains("79990001122"));
    }

    #[test]
    fn non_json_answers_pass_through() {
        let msg = format_answer(&answered("done"));
        assert!(msg.contains("done"));
    }
}
