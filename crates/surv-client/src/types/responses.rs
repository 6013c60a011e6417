/*
[INPUT]:  Backend schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When backend auth or action responses change
*/

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{FileCategory, NotificationChannel, VerificationMethod};
use super::models::serde_helpers;
use super::models::{Campaign, User};

/// Session issuance response from `lemma-verify` (and the password login)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
    /// Free-form on the backend ("lemma", "unverified", crypto engine name)
    #[serde(default)]
    pub verification_method: Option<String>,
}

impl TokenResponse {
    pub fn method(&self) -> VerificationMethod {
        match self.verification_method.as_deref() {
            Some("password") => VerificationMethod::Password,
            Some("magic-link") => VerificationMethod::MagicLink,
            _ => VerificationMethod::Lemma,
        }
    }
}

/// Public Lemma configuration from `GET /api/v1/auth/lemma-config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LemmaConfigResponse {
    pub configured: bool,
    #[serde(default)]
    pub site_id: Option<String>,
}

impl LemmaConfigResponse {
    /// Site id when Lemma is configured and the id is non-empty
    pub fn site_id(&self) -> Option<&str> {
        if !self.configured {
            return None;
        }
        self.site_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Acknowledgement from `PUT /api/v1/users/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserUpdated {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub user_id: String,
}

/// Plain `{"message": ...}` acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ### Payments

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub client_secret: String,
    #[serde(deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub amount: Decimal,
    pub currency: String,
    pub invoice_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub invoice_id: String,
    #[serde(deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub amount_paid: Decimal,
}

/// Invoice totals after a manual payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub invoice_id: String,
    #[serde(deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub total_paid: Decimal,
    #[serde(deserialize_with = "serde_helpers::deserialize_decimal_or_zero")]
    pub amount_due: Decimal,
}

// ### Notifications and campaigns

/// Outcome of an SMS send. The backend answers 200 even when the gateway
/// fails; `status` is `sent`, `mock_sent` (no gateway configured) or `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsDispatch {
    pub status: String,
    pub to: String,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SmsDispatch {
    pub fn failed(&self) -> bool {
        self.status == "error"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDispatch {
    pub status: String,
    pub to: String,
    pub subject: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Channels a job reminder or confirmation went out on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsSent {
    pub status: String,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub notifications_sent: Vec<NotificationChannel>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCreated {
    pub status: String,
    pub campaign_name: String,
    pub recipients_count: u32,
    /// Timestamp, or `immediately`
    pub scheduled_for: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignList {
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCreated {
    pub status: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub message: Option<String>,
}

// ### Files, booking, recurring jobs

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub category: Option<FileCategory>,
    #[serde(deserialize_with = "serde_helpers::deserialize_utc")]
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub job_number: String,
    pub customer_id: String,
    pub job_id: String,
    #[serde(default)]
    pub confirmation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedJob {
    pub id: String,
    pub job_number: String,
    pub scheduled_date: NaiveDate,
}

/// Jobs created by `POST /api/v1/recurring-jobs/{id}/generate`; dates that
/// already had a matching job are skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedJobs {
    pub generated_count: u32,
    #[serde(default)]
    pub jobs: Vec<GeneratedJob>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lemma_config_site_id() {
        let config: LemmaConfigResponse =
            serde_json::from_str(r#"{"configured": false, "site_id": null}"#).unwrap();
        assert_eq!(config.site_id(), None);

        let config: LemmaConfigResponse =
            serde_json::from_str(r#"{"configured": true, "site_id": ""}"#).unwrap();
        assert_eq!(config.site_id(), None);

        let config: LemmaConfigResponse =
            serde_json::from_str(r#"{"configured": true, "site_id": "site-123"}"#).unwrap();
        assert_eq!(config.site_id(), Some("site-123"));
    }

    #[test]
    fn test_token_response_method_defaults_to_lemma() {
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "tok",
            "user": {
                "id": "u-1",
                "email": "a@b.c",
                "role": "admin",
                "created_at": "2024-01-01T00:00:00"
            },
            "verification_method": "unverified"
        }))
        .unwrap();
        assert_eq!(response.token_type, "bearer");
        assert_eq!(response.method(), VerificationMethod::Lemma);
    }

    #[test]
    fn test_payment_receipt_accepts_float_amounts() {
        let receipt: PaymentReceipt = serde_json::from_value(serde_json::json!({
            "status": "success",
            "message": "Payment of $40.5 recorded",
            "invoice_id": "inv-1",
            "total_paid": 140.5,
            "amount_due": 59.5
        }))
        .unwrap();
        assert_eq!(receipt.total_paid, Decimal::new(1405, 1));
        assert_eq!(receipt.amount_due, Decimal::new(595, 1));
    }

    #[test]
    fn test_sms_dispatch_error_status() {
        let dispatch: SmsDispatch = serde_json::from_value(serde_json::json!({
            "status": "error",
            "to": "+15550100",
            "message": "Failed to send SMS: unreachable"
        }))
        .unwrap();
        assert!(dispatch.failed());
        assert_eq!(dispatch.sid, None);
    }
}
