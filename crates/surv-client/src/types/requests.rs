/*
[INPUT]:  Backend schema definitions and form field requirements
[OUTPUT]: Typed Rust request structs with serialization and validation
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When backend create/update schemas change
*/

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{
    EstimateStatus, FileCategory, FileEntity, InvoiceStatus, JobPriority, JobStatus, PaymentMethod,
    RecurrenceFrequency, TimeEntryType, UserRole,
};
use crate::http::{Result, SurvError};

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SurvError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_positive(field: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(SurvError::Validation(format!("{field} must be positive")));
    }
    Ok(())
}

/// Customer form payload, used for both create (POST) and edit (PUT)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CustomerInput {
    pub fn validate(&self) -> Result<()> {
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)
    }
}

/// Job form payload.
///
/// `scheduled_date` is not compared against today; past dates are sent as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCreate {
    pub customer_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    pub scheduled_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_end_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub priority: JobPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl JobCreate {
    pub fn new(customer_id: impl Into<String>, title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            customer_id: customer_id.into(),
            title: title.into(),
            description: None,
            job_type: None,
            scheduled_date: date,
            scheduled_start_time: None,
            scheduled_end_time: None,
            estimated_duration: None,
            priority: JobPriority::Normal,
            assigned_to: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("customer_id", &self.customer_id)?;
        require("title", &self.title)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_end_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<JobPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        match &self.title {
            Some(title) => require("title", title),
            None => Ok(()),
        }
    }
}

/// Filters for `GET /api/v1/jobs`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(rename = "status_filter", skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceCreate {
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub discount_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl InvoiceCreate {
    pub fn validate(&self) -> Result<()> {
        require("customer_id", &self.customer_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemInput {
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateCreate {
    pub customer_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub tax_rate: Decimal,
    pub discount_amount: Decimal,
    #[serde(default)]
    pub line_items: Vec<LineItemInput>,
}

impl EstimateCreate {
    pub fn validate(&self) -> Result<()> {
        require("customer_id", &self.customer_id)?;
        require("title", &self.title)?;
        for item in &self.line_items {
            require("line item name", &item.item_name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EstimateStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntryCreate {
    pub entry_type: TimeEntryType,
    pub entry_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TimeEntryCreate {
    pub fn now(entry_type: TimeEntryType) -> Self {
        Self {
            entry_type,
            entry_time: Utc::now(),
            job_id: None,
            latitude: None,
            longitude: None,
            notes: None,
        }
    }
}

/// Filters for `GET /api/v1/time-tracking`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Filters for `GET /api/v1/users`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserQuery {
    #[serde(rename = "role_filter", skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Body of `PUT /api/v1/users/{id}`; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// ### Payments

/// Body of `POST /api/v1/payments/create-payment-intent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntentCreate {
    pub invoice_id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl PaymentIntentCreate {
    pub fn validate(&self) -> Result<()> {
        require("invoice_id", &self.invoice_id)?;
        require_positive("amount", self.amount)
    }
}

/// Body of `POST /api/v1/payments/confirm-payment`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentConfirm {
    pub payment_intent_id: String,
    pub invoice_id: String,
}

/// Query of `POST /api/v1/payments/record-payment`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualPayment {
    pub invoice_id: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ManualPayment {
    pub fn validate(&self) -> Result<()> {
        require("invoice_id", &self.invoice_id)?;
        require_positive("amount", self.amount)?;
        if !self.payment_method.is_manual() {
            return Err(SurvError::Validation(
                "card payments go through a payment intent".to_string(),
            ));
        }
        Ok(())
    }
}

// ### Notifications and campaigns

/// Body of `POST /api/v1/notifications/sms/send`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsNotification {
    pub to: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

impl SmsNotification {
    pub fn validate(&self) -> Result<()> {
        require("to", &self.to)?;
        require("message", &self.message)
    }
}

/// Body of `POST /api/v1/notifications/email/send`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailNotification {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl EmailNotification {
    pub fn validate(&self) -> Result<()> {
        require("to", &self.to)?;
        require("subject", &self.subject)
    }
}

/// Query of `POST /api/v1/notifications/job-reminder/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReminderChannels {
    pub send_sms: bool,
    pub send_email: bool,
}

impl Default for ReminderChannels {
    fn default() -> Self {
        Self {
            send_sms: true,
            send_email: true,
        }
    }
}

/// Body of `POST /api/v1/campaigns/email/create`. No targets means every
/// customer with an email address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailCampaign {
    pub name: String,
    pub subject: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub target_customers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl EmailCampaign {
    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("subject", &self.subject)?;
        require("body", &self.body)
    }
}

/// Query of `POST /api/v1/campaigns/templates/create`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateCreate {
    pub name: String,
    pub subject: String,
    pub body: String,
    pub category: String,
}

impl TemplateCreate {
    pub fn new(name: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subject: subject.into(),
            body: body.into(),
            category: "general".to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("subject", &self.subject)
    }
}

// ### Reports

/// Report window; the backend defaults to the last 30 days
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
}

// ### Online booking

/// Query of `GET /api/v1/booking/availability`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityQuery {
    pub service_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl AvailabilityQuery {
    pub fn validate(&self) -> Result<()> {
        require("service_type", &self.service_type)?;
        if self.end_date < self.start_date {
            return Err(SurvError::Validation(
                "end_date must not be before start_date".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body of `POST /api/v1/booking/submit`. Unknown emails create a customer;
/// the job starts out pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    pub service_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub preferred_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<NaiveTime>,
    #[serde(default)]
    pub priority: JobPriority,
}

impl BookingRequest {
    pub fn validate(&self) -> Result<()> {
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)?;
        require("email", &self.email)?;
        require("phone", &self.phone)?;
        require("service_type", &self.service_type)
    }
}

// ### Recurring jobs

/// Filters for `GET /api/v1/recurring-jobs`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringJobQuery {
    pub active_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Default for RecurringJobQuery {
    fn default() -> Self {
        Self {
            active_only: true,
            customer_id: None,
            skip: None,
            limit: None,
        }
    }
}

/// Body of `POST /api/v1/recurring-jobs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringJobCreate {
    pub customer_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    pub frequency: RecurrenceFrequency,
    pub interval: u32,
    /// 0 = Monday
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u8>,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub priority: JobPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl RecurringJobCreate {
    pub fn new(
        customer_id: impl Into<String>,
        title: impl Into<String>,
        frequency: RecurrenceFrequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            title: title.into(),
            description: None,
            job_type: None,
            frequency,
            interval: 1,
            day_of_week: None,
            day_of_month: None,
            start_date,
            end_date: None,
            estimated_duration: None,
            priority: JobPriority::Normal,
            assigned_to: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("customer_id", &self.customer_id)?;
        require("title", &self.title)?;
        if self.interval == 0 {
            return Err(SurvError::Validation("interval must be at least 1".to_string()));
        }
        match (self.frequency, self.day_of_week, self.day_of_month) {
            (RecurrenceFrequency::Weekly, None, _) => {
                return Err(SurvError::Validation(
                    "weekly schedules need day_of_week".to_string(),
                ));
            }
            (_, Some(day), _) if day > 6 => {
                return Err(SurvError::Validation("day_of_week must be 0-6".to_string()));
            }
            (_, _, Some(day)) if !(1..=31).contains(&day) => {
                return Err(SurvError::Validation("day_of_month must be 1-31".to_string()));
            }
            _ => {}
        }
        if self.end_date.is_some_and(|end| end < self.start_date) {
            return Err(SurvError::Validation(
                "end_date must not be before start_date".to_string(),
            ));
        }
        Ok(())
    }
}

// ### Files

/// One file for `POST /api/v1/files/upload`, sent as multipart form data
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub entity_type: FileEntity,
    pub entity_id: String,
    pub file_name: String,
    pub content: Vec<u8>,
    pub mime_type: Option<String>,
    pub category: Option<FileCategory>,
    pub description: Option<String>,
}

impl FileUpload {
    pub fn new(
        entity_type: FileEntity,
        entity_id: impl Into<String>,
        file_name: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.into(),
            file_name: file_name.into(),
            content,
            mime_type: None,
            category: None,
            description: None,
        }
    }

    pub fn with_category(mut self, category: FileCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("entity_id", &self.entity_id)?;
        require("file_name", &self.file_name)?;
        if self.content.is_empty() {
            return Err(SurvError::Validation("file is empty".to_string()));
        }
        Ok(())
    }
}

/// Body of `POST /api/v1/auth/lemma-verify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LemmaVerifyRequest {
    pub user_did: String,
    pub user_email: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub lemmas: Vec<serde_json::Value>,
    #[serde(default)]
    pub create_account: bool,
}

impl LemmaVerifyRequest {
    /// Build the request for a PPID. Wallet identities have no mailbox, so the
    /// backend keys them by a synthetic `<last 8 chars>@wallet.lemma.id`.
    pub fn for_ppid(ppid: &str, permissions: Vec<String>, lemmas: Vec<serde_json::Value>) -> Self {
        Self {
            user_did: ppid.to_string(),
            user_email: wallet_email(ppid),
            permissions,
            lemmas,
            create_account: false,
        }
    }
}

pub fn wallet_email(ppid: &str) -> String {
    let chars: Vec<char> = ppid.chars().collect();
    let start = chars.len().saturating_sub(8);
    let suffix: String = chars[start..].iter().collect();
    format!("{suffix}@wallet.lemma.id")
}
