/*
[INPUT]:  Job form payloads, filters and status actions
[OUTPUT]: Job records
[POS]:    HTTP layer - job endpoints (require bearer auth)
[UPDATE]: When adding job endpoints or status actions
*/

use reqwest::Method;

use crate::http::{Result, SurvClient};
use crate::types::{Job, JobCreate, JobQuery, JobStatus, JobUpdate};

impl SurvClient {
    /// GET /api/v1/jobs?skip&limit&status_filter&date_from&date_to&assigned_to
    ///
    /// Technicians only ever receive their own assignments.
    pub async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>> {
        let builder = self.request(Method::GET, "/api/v1/jobs")?.query(query);
        self.send_json(builder).await
    }

    /// GET /api/v1/jobs/{id}
    pub async fn get_job(&self, id: &str) -> Result<Job> {
        let builder = self.request(Method::GET, &format!("/api/v1/jobs/{id}"))?;
        self.send_json(builder).await
    }

    /// POST /api/v1/jobs
    pub async fn create_job(&self, job: &JobCreate) -> Result<Job> {
        job.validate()?;
        let builder = self.request(Method::POST, "/api/v1/jobs")?.json(job);
        self.send_json(builder).await
    }

    /// PUT /api/v1/jobs/{id}
    pub async fn update_job(&self, id: &str, update: &JobUpdate) -> Result<Job> {
        update.validate()?;
        let builder = self
            .request(Method::PUT, &format!("/api/v1/jobs/{id}"))?
            .json(update);
        self.send_json(builder).await
    }

    /// DELETE /api/v1/jobs/{id}
    pub async fn delete_job(&self, id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("/api/v1/jobs/{id}"))?;
        self.send_empty(builder).await
    }

    pub async fn start_job(&self, id: &str) -> Result<Job> {
        self.set_job_status(id, JobStatus::InProgress).await
    }

    pub async fn complete_job(&self, id: &str) -> Result<Job> {
        self.set_job_status(id, JobStatus::Completed).await
    }

    pub async fn cancel_job(&self, id: &str) -> Result<Job> {
        self.set_job_status(id, JobStatus::Cancelled).await
    }

    // The backend has no transition endpoints; actions are status updates.
    async fn set_job_status(&self, id: &str, status: JobStatus) -> Result<Job> {
        self.update_job(id, &JobUpdate::status(status)).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::test_support::{client_for, job_json};

    #[tokio::test]
    async fn test_list_jobs_sends_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/jobs"))
            .and(query_param("status_filter", "scheduled"))
            .and(query_param("date_from", "2024-06-01"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([job_json("j-1", "scheduled")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let query = JobQuery {
            status: Some(JobStatus::Scheduled),
            date_from: NaiveDate::from_ymd_opt(2024, 6, 1),
            ..JobQuery::default()
        };
        let jobs = client_for(&server).list_jobs(&query).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, JobStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_create_job_with_past_date_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/jobs"))
            .and(body_partial_json(json!({"scheduled_date": "2019-03-04"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(job_json("j-2", "scheduled")))
            .expect(1)
            .mount(&server)
            .await;

        let past = NaiveDate::from_ymd_opt(2019, 3, 4).unwrap();
        let job = JobCreate::new("c-1", "Backdated repair", past);
        let created = client_for(&server).create_job(&job).await.unwrap();
        assert_eq!(created.id, "j-2");
    }

    #[tokio::test]
    async fn test_complete_job_sends_status_only() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/jobs/j-1"))
            .and(body_json(json!({"status": "completed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_json("j-1", "completed")))
            .expect(1)
            .mount(&server)
            .await;

        let job = client_for(&server).complete_job("j-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_forbidden_update_surfaces_detail() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/jobs/j-9"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "detail": "Not authorized to update this job"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).cancel_job("j-9").await.unwrap_err();
        assert!(err.is_auth_error());
        assert_eq!(err.detail(), Some("Not authorized to update this job"));
    }
}
