/*
[INPUT]:  Invoice and estimate payloads, payment records
[OUTPUT]: Invoice and estimate records as computed by the backend
[POS]:    HTTP layer - billing endpoints (require bearer auth)
[UPDATE]: When invoice or estimate routes change
*/

// ### Invoices

use reqwest::Method;

use crate::http::{Result, SurvClient};
use crate::types::{
    Estimate, EstimateCreate, EstimateUpdate, Invoice, InvoiceCreate, InvoiceUpdate,
    RecordPaymentRequest,
};

impl SurvClient {
    /// GET /api/v1/invoices
    pub async fn list_invoices(&self, skip: Option<u32>, limit: Option<u32>) -> Result<Vec<Invoice>> {
        let builder = self
            .request(Method::GET, "/api/v1/invoices")?
            .query(&paging(skip, limit));
        self.send_json(builder).await
    }

    /// GET /api/v1/invoices/{id}
    pub async fn get_invoice(&self, id: &str) -> Result<Invoice> {
        let builder = self.request(Method::GET, &format!("/api/v1/invoices/{id}"))?;
        self.send_json(builder).await
    }

    /// POST /api/v1/invoices
    pub async fn create_invoice(&self, invoice: &InvoiceCreate) -> Result<Invoice> {
        invoice.validate()?;
        let builder = self.request(Method::POST, "/api/v1/invoices")?.json(invoice);
        self.send_json(builder).await
    }

    /// PUT /api/v1/invoices/{id}
    pub async fn update_invoice(&self, id: &str, update: &InvoiceUpdate) -> Result<Invoice> {
        let builder = self
            .request(Method::PUT, &format!("/api/v1/invoices/{id}"))?
            .json(update);
        self.send_json(builder).await
    }

    /// POST /api/v1/invoices/{id}/send
    pub async fn send_invoice(&self, id: &str) -> Result<Invoice> {
        let builder = self.request(Method::POST, &format!("/api/v1/invoices/{id}/send"))?;
        self.send_json(builder).await
    }

    /// Record a (partial) payment. The backend recomputes `amount_due`.
    ///
    /// POST /api/v1/invoices/{id}/pay?amount={amount}
    pub async fn record_invoice_payment(
        &self,
        id: &str,
        payment: &RecordPaymentRequest,
    ) -> Result<Invoice> {
        let builder = self
            .request(Method::POST, &format!("/api/v1/invoices/{id}/pay"))?
            .query(payment);
        self.send_json(builder).await
    }
}

// ### Estimates

impl SurvClient {
    /// GET /api/v1/estimates
    pub async fn list_estimates(
        &self,
        skip: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<Estimate>> {
        let builder = self
            .request(Method::GET, "/api/v1/estimates")?
            .query(&paging(skip, limit));
        self.send_json(builder).await
    }

    /// GET /api/v1/estimates/{id}
    pub async fn get_estimate(&self, id: &str) -> Result<Estimate> {
        let builder = self.request(Method::GET, &format!("/api/v1/estimates/{id}"))?;
        self.send_json(builder).await
    }

    /// POST /api/v1/estimates
    pub async fn create_estimate(&self, estimate: &EstimateCreate) -> Result<Estimate> {
        estimate.validate()?;
        let builder = self.request(Method::POST, "/api/v1/estimates")?.json(estimate);
        self.send_json(builder).await
    }

    /// PUT /api/v1/estimates/{id}
    pub async fn update_estimate(&self, id: &str, update: &EstimateUpdate) -> Result<Estimate> {
        let builder = self
            .request(Method::PUT, &format!("/api/v1/estimates/{id}"))?
            .json(update);
        self.send_json(builder).await
    }

    /// With `create_job`, admins and managers also get a pending job for the
    /// estimate's customer; the flag is ignored for other roles.
    ///
    /// POST /api/v1/estimates/{id}/approve?create_job
    pub async fn approve_estimate(&self, id: &str, create_job: bool) -> Result<Estimate> {
        let builder = self
            .request(Method::POST, &format!("/api/v1/estimates/{id}/approve"))?
            .query(&[("create_job", create_job)]);
        self.send_json(builder).await
    }

    /// DELETE /api/v1/estimates/{id}
    pub async fn delete_estimate(&self, id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("/api/v1/estimates/{id}"))?;
        self.send_empty(builder).await
    }
}

fn paging(skip: Option<u32>, limit: Option<u32>) -> Vec<(&'static str, u32)> {
    [("skip", skip), ("limit", limit)]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::test_support::{client_for, estimate_json, invoice_json};
    use crate::types::{EstimateStatus, InvoiceStatus};

    #[tokio::test]
    async fn test_record_payment_uses_query_amount() {
        let server = MockServer::start().await;
        let mut paid = invoice_json("inv-1", "partial");
        paid["amount_paid"] = json!("75.00");
        paid["amount_due"] = json!("125.00");

        Mock::given(method("POST"))
            .and(path("/api/v1/invoices/inv-1/pay"))
            .and(query_param("amount", "75.00"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paid))
            .expect(1)
            .mount(&server)
            .await;

        let payment = RecordPaymentRequest {
            amount: "75.00".parse().unwrap(),
            payment_method: None,
            reference: None,
        };
        let invoice = client_for(&server)
            .record_invoice_payment("inv-1", &payment)
            .await
            .unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Partial);
        assert_eq!(invoice.amount_due, "125.00".parse::<Decimal>().unwrap());
    }

    #[tokio::test]
    async fn test_send_invoice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/invoices/inv-2/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(invoice_json("inv-2", "sent")))
            .expect(1)
            .mount(&server)
            .await;

        let invoice = client_for(&server).send_invoice("inv-2").await.unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Sent);
    }

    #[tokio::test]
    async fn test_list_estimates_and_approve() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/estimates"))
            .and(query_param("limit", "10"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([estimate_json("est-1", "sent")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/estimates/est-1/approve"))
            .and(query_param("create_job", "true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(estimate_json("est-1", "approved")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let estimates = client.list_estimates(None, Some(10)).await.unwrap();
        assert_eq!(estimates[0].line_items.len(), 1);

        let approved = client.approve_estimate(&estimates[0].id, true).await.unwrap();
        assert_eq!(approved.status, EstimateStatus::Approved);
    }

    #[tokio::test]
    async fn test_approve_estimate_without_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/estimates/est-2/approve"))
            .and(query_param("create_job", "false"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(estimate_json("est-2", "approved")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let approved = client_for(&server)
            .approve_estimate("est-2", false)
            .await
            .unwrap();
        assert_eq!(approved.status, EstimateStatus::Approved);
    }

    #[test]
    fn test_paging_skips_missing() {
        assert_eq!(paging(None, Some(5)), vec![("limit", 5)]);
        assert!(paging(None, None).is_empty());
    }
}
