/*
[INPUT]:  Backend schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When backend response models change or new entities are added
*/

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{
    EstimateStatus, FileCategory, InvoiceStatus, JobPriority, JobStatus, RecurrenceFrequency,
    SmsDirection, TimeEntryType, UserRole,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: UserRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma_did: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() { self.email.clone() } else { name }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_customer_status")]
    pub status: String,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive match over name, email, phone and company.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        let full_name = self.full_name().to_lowercase();
        full_name.contains(&query)
            || [
                self.email.as_deref(),
                self.phone.as_deref(),
                self.mobile.as_deref(),
                self.company_name.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub job_number: String,
    pub customer_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub scheduled_start_time: Option<NaiveTime>,
    #[serde(default)]
    pub scheduled_end_time: Option<NaiveTime>,
    /// Minutes
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub priority: JobPriority,
    pub status: JobStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub updated_at: DateTime<Utc>,
}

/// Invoice as computed by the backend. `amount_due` is taken as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub customer_id: String,
    #[serde(default)]
    pub job_id: Option<String>,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub subtotal: Decimal,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub tax_rate: Decimal,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub tax_amount: Decimal,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub discount_amount: Decimal,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub total_amount: Decimal,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub amount_paid: Decimal,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub amount_due: Decimal,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateLineItem {
    pub id: String,
    pub item_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub id: String,
    pub estimate_number: String,
    pub customer_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: EstimateStatus,
    pub valid_until: NaiveDate,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub subtotal: Decimal,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub tax_rate: Decimal,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub tax_amount: Decimal,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub discount_amount: Decimal,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub line_items: Vec<EstimateLineItem>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_utc_opt")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub converted_to_job_id: Option<String>,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    pub employee_id: String,
    pub entry_type: TimeEntryType,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub entry_time: DateTime<Utc>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub latitude: Option<Decimal>,
    #[serde(default)]
    pub longitude: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsMessage {
    pub id: String,
    pub from_number: String,
    pub to_number: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub direction: Option<SmsDirection>,
    /// clock_in, on_my_way, start_job, finish_job, upload_summary
    #[serde(default)]
    pub command_type: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_utc_opt")]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_utc_opt")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub has_media: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    /// on_my_way, arrived, started, completed
    pub event_type: String,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub event_time: DateTime<Utc>,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub travel_time_minutes: Option<i64>,
    #[serde(default)]
    pub job_duration_minutes: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Messages and timeline for one job, fetched together
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobActivity {
    pub messages: Vec<SmsMessage>,
    pub timeline: Vec<TimelineEvent>,
}

impl JobActivity {
    /// The most recent inbound SMS command, if any.
    pub fn last_command(&self) -> Option<&str> {
        self.messages
            .iter()
            .filter(|message| message.direction == Some(SmsDirection::Inbound))
            .filter_map(|message| {
                message
                    .command_type
                    .as_deref()
                    .map(|command| (message.received_at, command))
            })
            .max_by_key(|(received_at, _)| *received_at)
            .map(|(_, command)| command)
    }
}

/// Template that generates jobs on a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringJob {
    pub id: String,
    pub customer_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    pub frequency: RecurrenceFrequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub day_of_week: Option<u8>,
    #[serde(default)]
    pub day_of_month: Option<u8>,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub start_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_utc_opt")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub priority: JobPriority,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_utc_opt")]
    pub last_generated: Option<DateTime<Utc>>,
}

/// Upload metadata from `GET /api/v1/files/{entity_type}/{entity_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub category: Option<FileCategory>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
}

/// Service offered through online booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingService {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub date: NaiveDate,
    /// `HH:MM`
    pub time_slot: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub status: String,
    #[serde(default)]
    pub recipients_count: u32,
    #[serde(default)]
    pub sent_count: u32,
    #[serde(default)]
    pub opened_count: u32,
    #[serde(default)]
    pub clicked_count: u32,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub category: Option<String>,
}

fn default_interval() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_customer_status() -> String {
    "active".to_string()
}

pub(crate) mod serde_helpers {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::str::FromStr;

    /// The backend emits naive UTC timestamps (`2024-05-01T09:30:00`), other
    /// producers emit RFC 3339. Accept both.
    pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize_utc<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_utc(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn deserialize_utc_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(raw) => parse_utc(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
        }
    }

    pub fn deserialize_decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(Decimal::ZERO);
        }

        if let Some(raw) = value.as_str() {
            if raw.trim().is_empty() {
                return Ok(Decimal::ZERO);
            }
            return Decimal::from_str(raw).map_err(serde::de::Error::custom);
        }

        if value.is_number() {
            return Decimal::from_str(&value.to_string()).map_err(serde::de::Error::custom);
        }

        Err(serde::de::Error::custom("invalid decimal value"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn customer(first: &str, last: &str, email: Option<&str>, company: Option<&str>) -> Customer {
        serde_json::from_value(json!({
            "id": "c-1",
            "first_name": first,
            "last_name": last,
            "email": email,
            "company_name": company,
            "created_at": "2024-01-01T00:00:00",
            "updated_at": "2024-01-01T00:00:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_invoice_trusts_backend_amount_due() {
        let invoice: Invoice = serde_json::from_value(json!({
            "id": "inv-1",
            "invoice_number": "INV-00001",
            "customer_id": "c-1",
            "status": "partial",
            "issue_date": "2024-03-01",
            "due_date": "2024-03-31",
            "subtotal": "100.00",
            "tax_rate": "8.25",
            "tax_amount": "8.25",
            "discount_amount": null,
            "total_amount": "108.25",
            "amount_paid": 50,
            "amount_due": "40.00",
            "created_at": "2024-03-01T10:00:00.123456",
            "updated_at": "2024-03-02T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Partial);
        assert_eq!(invoice.discount_amount, Decimal::ZERO);
        assert_eq!(invoice.amount_paid, Decimal::from(50));
        // Not total - paid: the backend figure wins.
        assert_eq!(invoice.amount_due, "40.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_job_deserializes_backend_shape() {
        let job: Job = serde_json::from_value(json!({
            "id": "j-1",
            "job_number": "JOB-00001",
            "customer_id": "c-1",
            "title": "AC repair",
            "scheduled_date": "2024-06-01",
            "scheduled_start_time": "09:00:00",
            "priority": "urgent",
            "status": "scheduled",
            "created_at": "2024-05-01T09:30:00",
            "updated_at": "2024-05-01T09:30:00"
        }))
        .unwrap();

        assert_eq!(job.priority, JobPriority::Urgent);
        assert_eq!(job.status, JobStatus::Scheduled);
        assert_eq!(
            job.scheduled_start_time,
            Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
        );
        assert!(job.assigned_to.is_none());
    }

    #[test]
    fn test_customer_matches_search() {
        let c = customer("Ada", "Lovelace", Some("ada@example.com"), Some("Engines Ltd"));
        assert!(c.matches("ada lov"));
        assert!(c.matches("EXAMPLE.COM"));
        assert!(c.matches("engines"));
        assert!(c.matches("  "));
        assert!(!c.matches("babbage"));
    }

    #[test]
    fn test_user_display_name_falls_back_to_email() {
        let user: User = serde_json::from_value(json!({
            "id": "u-1",
            "email": "tech@surv.com",
            "role": "technician",
            "created_at": "2024-01-01T00:00:00"
        }))
        .unwrap();
        assert_eq!(user.display_name(), "tech@surv.com");
        assert!(user.is_active);
    }

    #[test]
    fn test_job_activity_last_command() {
        let activity = JobActivity {
            messages: serde_json::from_value(json!([
                {"id": "1", "from_number": "+1", "to_number": "+2", "direction": "inbound",
                 "command_type": "on_my_way", "received_at": "2024-01-01T08:00:00"},
                {"id": "2", "from_number": "+2", "to_number": "+1", "direction": "outbound",
                 "command_type": "ack", "received_at": "2024-01-01T09:00:00"},
                {"id": "3", "from_number": "+1", "to_number": "+2", "direction": "inbound",
                 "command_type": "start_job", "received_at": "2024-01-01T08:30:00"}
            ]))
            .unwrap(),
            timeline: Vec::new(),
        };
        assert_eq!(activity.last_command(), Some("start_job"));
    }
}
