/*
[INPUT]:  Recurring job templates and generation horizons
[OUTPUT]: Recurring job records and generated job summaries
[POS]:    HTTP layer - recurring job endpoints (writes need admin or manager)
[UPDATE]: When recurrence fields or generation rules change
*/

use reqwest::Method;

use crate::http::{Result, SurvClient};
use crate::types::{GeneratedJobs, RecurringJob, RecurringJobCreate, RecurringJobQuery};

impl SurvClient {
    /// GET /api/v1/recurring-jobs?active_only&customer_id&skip&limit
    pub async fn list_recurring_jobs(&self, query: &RecurringJobQuery) -> Result<Vec<RecurringJob>> {
        let builder = self
            .request(Method::GET, "/api/v1/recurring-jobs")?
            .query(query);
        self.send_json(builder).await
    }

    /// POST /api/v1/recurring-jobs
    pub async fn create_recurring_job(&self, job: &RecurringJobCreate) -> Result<RecurringJob> {
        job.validate()?;
        let builder = self
            .request(Method::POST, "/api/v1/recurring-jobs")?
            .json(job);
        self.send_json(builder).await
    }

    /// Create the jobs due within `days_ahead` days (backend default 30).
    ///
    /// POST /api/v1/recurring-jobs/{id}/generate?days_ahead
    pub async fn generate_recurring_jobs(
        &self,
        id: &str,
        days_ahead: Option<u32>,
    ) -> Result<GeneratedJobs> {
        let mut builder = self.request(
            Method::POST,
            &format!("/api/v1/recurring-jobs/{id}/generate"),
        )?;
        if let Some(days) = days_ahead {
            builder = builder.query(&[("days_ahead", days)]);
        }
        self.send_json(builder).await
    }

    /// Soft delete: the template is deactivated, generated jobs stay.
    ///
    /// DELETE /api/v1/recurring-jobs/{id}
    pub async fn deactivate_recurring_job(&self, id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("/api/v1/recurring-jobs/{id}"))?;
        self.send_empty(builder).await
    }
}
