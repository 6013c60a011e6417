/*
[INPUT]:  Optional report date ranges
[OUTPUT]: Dashboard counters, revenue, technician and job-status reports
[POS]:    HTTP layer - reporting endpoints (read only)
[UPDATE]: When report routes or metrics change
*/

use reqwest::Method;

use crate::http::{Result, SurvClient};
use crate::types::{DashboardStats, DateRange, JobsByStatus, RevenueReport, TechnicianReport};

impl SurvClient {
    /// GET /api/v1/reports/dashboard
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let builder = self.request(Method::GET, "/api/v1/reports/dashboard")?;
        self.send_json(builder).await
    }

    /// GET /api/v1/reports/revenue?date_from&date_to
    pub async fn revenue_report(&self, range: &DateRange) -> Result<RevenueReport> {
        let builder = self
            .request(Method::GET, "/api/v1/reports/revenue")?
            .query(range);
        self.send_json(builder).await
    }

    /// GET /api/v1/reports/technicians?date_from&date_to
    pub async fn technician_report(&self, range: &DateRange) -> Result<TechnicianReport> {
        let builder = self
            .request(Method::GET, "/api/v1/reports/technicians")?
            .query(range);
        self.send_json(builder).await
    }

    /// GET /api/v1/reports/jobs-by-status
    pub async fn jobs_by_status(&self) -> Result<JobsByStatus> {
        let builder = self.request(Method::GET, "/api/v1/reports/jobs-by-status")?;
        self.send_json(builder).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::test_support::client_for;
    use crate::types::{DateRange, JobStatus};

    #[tokio::test]
    async fn test_dashboard_stats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/reports/dashboard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "customers": {"total": 120, "active": 120},
                "jobs": {"total": 300, "active": 12, "completed": 270, "today": 4},
                "invoices": {"total": 260, "paid": 240, "unpaid": 20},
                "revenue": {"total": 98000.5, "outstanding": 4200.0, "this_month": 7300.25}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stats = client_for(&server).dashboard_stats().await.unwrap();
        assert_eq!(stats.jobs.today, 4);
        assert_eq!(stats.invoices.unpaid, 20);
        assert_eq!(stats.revenue.this_month, "7300.25".parse::<Decimal>().unwrap());
    }

    #[tokio::test]
    async fn test_technician_report_sends_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/reports/technicians"))
            .and(query_param("date_from", "2024-05-01"))
            .and(query_param("date_to", "2024-05-31"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "date_from": "2024-05-01",
                "date_to": "2024-05-31",
                "technicians": [{
                    "id": "u-3",
                    "name": "Tess Tech",
                    "total_jobs": 8,
                    "completed_jobs": 6,
                    "completion_rate": 75.0
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let range = DateRange {
            date_from: NaiveDate::from_ymd_opt(2024, 5, 1),
            date_to: NaiveDate::from_ymd_opt(2024, 5, 31),
        };
        let report = client_for(&server).technician_report(&range).await.unwrap();
        assert_eq!(report.technicians[0].completed_jobs, 6);
        assert!((report.technicians[0].completion_rate - 75.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_revenue_and_status_reports() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/reports/revenue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "date_from": "2024-05-01",
                "date_to": "2024-05-31",
                "daily_revenue": [
                    {"date": "2024-05-02", "total": 250.0, "paid": 250.0, "invoice_count": 1}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/reports/jobs-by-status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "by_status": [
                    {"status": "completed", "count": 9},
                    {"status": "in_progress", "count": 2}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let revenue = client.revenue_report(&DateRange::default()).await.unwrap();
        assert_eq!(revenue.collected(), Decimal::new(250, 0));

        let statuses = client.jobs_by_status().await.unwrap();
        assert_eq!(statuses.count(JobStatus::InProgress), 2);
    }
}
