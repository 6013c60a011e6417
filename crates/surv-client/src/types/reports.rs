/*
[INPUT]:  Backend report payloads
[OUTPUT]: Typed dashboard, revenue, technician and status reports
[POS]:    Data layer - reporting types (read only)
[UPDATE]: When report endpoints add or rename metrics
*/

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::JobStatus;
use super::models::serde_helpers;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub customers: CustomerCounts,
    pub jobs: JobCounts,
    pub invoices: InvoiceCounts,
    pub revenue: RevenueSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerCounts {
    pub total: u32,
    pub active: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobCounts {
    pub total: u32,
    pub active: u32,
    pub completed: u32,
    pub today: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvoiceCounts {
    pub total: u32,
    pub paid: u32,
    pub unpaid: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RevenueSummary {
    #[serde(deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub total: Decimal,
    #[serde(deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub outstanding: Decimal,
    #[serde(deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub this_month: Decimal,
}

/// Invoiced and collected amounts per day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueReport {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    #[serde(default)]
    pub daily_revenue: Vec<DailyRevenue>,
}

impl RevenueReport {
    pub fn invoiced(&self) -> Decimal {
        self.daily_revenue.iter().map(|day| day.total).sum()
    }

    pub fn collected(&self) -> Decimal {
        self.daily_revenue.iter().map(|day| day.paid).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    #[serde(deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub total: Decimal,
    #[serde(deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub paid: Decimal,
    pub invoice_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicianReport {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    #[serde(default)]
    pub technicians: Vec<TechnicianStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicianStats {
    pub id: String,
    pub name: String,
    pub total_jobs: u32,
    #[serde(default)]
    pub completed_jobs: u32,
    /// Percent, one decimal
    #[serde(default)]
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsByStatus {
    #[serde(default)]
    pub by_status: Vec<StatusCount>,
}

impl JobsByStatus {
    pub fn count(&self, status: JobStatus) -> u32 {
        self.by_status
            .iter()
            .filter(|entry| entry.status == status)
            .map(|entry| entry.count)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: JobStatus,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_revenue_report_totals() {
        let report: RevenueReport = serde_json::from_value(json!({
            "date_from": "2024-05-01",
            "date_to": "2024-05-31",
            "daily_revenue": [
                {"date": "2024-05-02", "total": 250.0, "paid": 100.0, "invoice_count": 2},
                {"date": "2024-05-03", "total": 99.99, "paid": 0, "invoice_count": 1}
            ]
        }))
        .unwrap();
        assert_eq!(report.invoiced(), "349.99".parse::<Decimal>().unwrap());
        assert_eq!(report.collected(), Decimal::new(100, 0));
    }

    #[test]
    fn test_jobs_by_status_folds_unknown_statuses() {
        let report: JobsByStatus = serde_json::from_value(json!({
            "by_status": [
                {"status": "scheduled", "count": 4},
                {"status": "pending", "count": 2},
                {"status": "on_hold", "count": 1}
            ]
        }))
        .unwrap();
        assert_eq!(report.count(JobStatus::Scheduled), 4);
        assert_eq!(report.count(JobStatus::Other), 3);
        assert_eq!(report.count(JobStatus::Completed), 0);
    }
}
