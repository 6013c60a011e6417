/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod auth;
pub mod billing;
pub mod booking;
pub mod campaigns;
pub mod client;
pub mod customers;
pub mod error;
pub mod files;
pub mod jobs;
pub mod notifications;
pub mod payments;
pub mod recurring_jobs;
pub mod reports;
pub mod sms;
pub mod time_tracking;
pub mod users;

pub use client::{ClientConfig, DEFAULT_BASE_URL, SurvClient};
pub use customers::filter_customers;
pub use error::{Result, SurvError};

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::{Value, json};
    use wiremock::MockServer;

    use super::SurvClient;
    use crate::app::Navigator;
    use crate::store::{ACCESS_TOKEN, AuthStore, LocalStore};

    /// Client pointed at `server`, already holding a bearer token
    pub fn client_for(server: &MockServer) -> SurvClient {
        let storage = LocalStore::in_memory();
        storage
            .set_item(ACCESS_TOKEN, "test-token")
            .expect("seed token");
        SurvClient::new(&server.uri(), AuthStore::new(storage), Navigator::new("/"))
            .expect("client init")
    }

    pub fn user_json(id: &str, role: &str) -> Value {
        json!({
            "id": id,
            "email": format!("{id}@surv.com"),
            "first_name": "Sam",
            "last_name": "Field",
            "role": role,
            "is_active": true,
            "email_verified": true,
            "created_at": "2024-01-01T00:00:00"
        })
    }

    pub fn customer_json(id: &str, first: &str, last: &str) -> Value {
        json!({
            "id": id,
            "first_name": first,
            "last_name": last,
            "email": format!("{}@example.com", first.to_lowercase()),
            "phone": "555-0100",
            "status": "active",
            "created_at": "2024-01-01T00:00:00",
            "updated_at": "2024-01-01T00:00:00"
        })
    }

    pub fn job_json(id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "job_number": "JOB-00042",
            "customer_id": "c-1",
            "title": "Replace water heater",
            "scheduled_date": "2024-06-01",
            "priority": "high",
            "status": status,
            "created_at": "2024-05-20T08:00:00",
            "updated_at": "2024-05-20T08:00:00"
        })
    }

    pub fn invoice_json(id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "invoice_number": "INV-00007",
            "customer_id": "c-1",
            "status": status,
            "issue_date": "2024-06-01",
            "due_date": "2024-07-01",
            "subtotal": "200.00",
            "tax_rate": "0",
            "tax_amount": "0",
            "discount_amount": "0",
            "total_amount": "200.00",
            "amount_paid": "0",
            "amount_due": "200.00",
            "created_at": "2024-06-01T00:00:00",
            "updated_at": "2024-06-01T00:00:00"
        })
    }

    pub fn estimate_json(id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "estimate_number": "EST-00003",
            "customer_id": "c-1",
            "title": "Kitchen rewiring",
            "status": status,
            "valid_until": "2024-07-15",
            "subtotal": "1500.00",
            "tax_rate": "0",
            "tax_amount": "0",
            "discount_amount": "0",
            "total_amount": "1500.00",
            "line_items": [{
                "id": "li-1",
                "item_name": "Labor",
                "quantity": "10",
                "unit_price": "150",
                "total_price": "1500",
                "sort_order": 0
            }],
            "created_at": "2024-06-15T00:00:00",
            "updated_at": "2024-06-15T00:00:00"
        })
    }
}
