/*
[INPUT]:  Job identifiers
[OUTPUT]: Per-job SMS messages, timeline events, combined activity
[POS]:    HTTP layer - read-only technician communication log
[UPDATE]: When SMS log routes change
*/

use reqwest::Method;

use crate::http::{Result, SurvClient};
use crate::types::{JobActivity, SmsMessage, TimelineEvent};

impl SurvClient {
    /// Newest first.
    ///
    /// GET /api/v1/sms/messages/{job_id}
    pub async fn job_messages(&self, job_id: &str) -> Result<Vec<SmsMessage>> {
        let builder = self.request(Method::GET, &format!("/api/v1/sms/messages/{job_id}"))?;
        self.send_json(builder).await
    }

    /// Oldest first.
    ///
    /// GET /api/v1/sms/timeline/{job_id}
    pub async fn job_timeline(&self, job_id: &str) -> Result<Vec<TimelineEvent>> {
        let builder = self.request(Method::GET, &format!("/api/v1/sms/timeline/{job_id}"))?;
        self.send_json(builder).await
    }

    /// Messages and timeline fetched concurrently; either failure fails both.
    pub async fn job_activity(&self, job_id: &str) -> Result<JobActivity> {
        let (messages, timeline) =
            tokio::try_join!(self.job_messages(job_id), self.job_timeline(job_id))?;
        Ok(JobActivity { messages, timeline })
    }
}
