/*
[INPUT]:  Email campaign and template definitions
[OUTPUT]: Campaign creation results, campaign history, template catalog
[POS]:    HTTP layer - marketing endpoints (admins and managers)
[UPDATE]: When campaign or template routes change
*/

use reqwest::Method;
use serde::Deserialize;

use crate::http::{Result, SurvClient};
use crate::types::{
    CampaignCreated, CampaignList, EmailCampaign, EmailTemplate, TemplateCreate, TemplateCreated,
};

#[derive(Deserialize)]
struct TemplateList {
    #[serde(default)]
    templates: Vec<EmailTemplate>,
}

impl SurvClient {
    /// POST /api/v1/campaigns/email/create
    pub async fn create_email_campaign(&self, campaign: &EmailCampaign) -> Result<CampaignCreated> {
        campaign.validate()?;
        let builder = self
            .request(Method::POST, "/api/v1/campaigns/email/create")?
            .json(campaign);
        self.send_json(builder).await
    }

    /// GET /api/v1/campaigns/email/list?skip&limit
    pub async fn list_email_campaigns(
        &self,
        skip: Option<u32>,
        limit: Option<u32>,
    ) -> Result<CampaignList> {
        let query: Vec<(&str, u32)> = [("skip", skip), ("limit", limit)]
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();
        let builder = self
            .request(Method::GET, "/api/v1/campaigns/email/list")?
            .query(&query);
        self.send_json(builder).await
    }

    /// Fields travel as query parameters.
    ///
    /// POST /api/v1/campaigns/templates/create?name&subject&body&category
    pub async fn create_email_template(&self, template: &TemplateCreate) -> Result<TemplateCreated> {
        template.validate()?;
        let builder = self
            .request(Method::POST, "/api/v1/campaigns/templates/create")?
            .query(template);
        self.send_json(builder).await
    }

    /// GET /api/v1/campaigns/templates/list
    pub async fn list_email_templates(&self) -> Result<Vec<EmailTemplate>> {
        let builder = self.request(Method::GET, "/api/v1/campaigns/templates/list")?;
        let list: TemplateList = self.send_json(builder).await?;
        Ok(list.templates)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::test_support::client_for;
    use crate::types::{EmailCampaign, TemplateCreate};

    #[tokio::test]
    async fn test_campaign_to_all_customers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/campaigns/email/create"))
            .and(body_partial_json(json!({
                "name": "Spring tune-up",
                "target_customers": []
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "created",
                "campaign_name": "Spring tune-up",
                "recipients_count": 38,
                "scheduled_for": "immediately",
                "message": "Campaign created with 38 recipients"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = client_for(&server)
            .create_email_campaign(&EmailCampaign {
                name: "Spring tune-up".to_string(),
                subject: "Book your AC check".to_string(),
                body: "<p>10% off in April</p>".to_string(),
                template: None,
                target_customers: Vec::new(),
                scheduled_at: None,
            })
            .await
            .unwrap();
        assert_eq!(created.recipients_count, 38);
        assert_eq!(created.scheduled_for, "immediately");
    }

    #[tokio::test]
    async fn test_campaign_list_forbidden_for_technicians() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/campaigns/email/list"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Access denied"})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.list_email_campaigns(None, None).await.unwrap_err();
        assert_eq!(err.detail(), Some("Access denied"));
        assert!(err.is_auth_error());
        // Forbidden is not a lost session
        assert!(client.auth_store().stored_token().is_some());
    }

    #[tokio::test]
    async fn test_templates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/campaigns/templates/create"))
            .and(query_param("name", "review_request"))
            .and(query_param("category", "general"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "created",
                "name": "review_request",
                "category": "general",
                "message": "Template created successfully"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/campaigns/templates/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "templates": [
                    {"name": "job_confirmation", "subject": "Job Confirmation", "category": "operations"},
                    {"name": "invoice_reminder", "subject": "Invoice Reminder", "category": "billing"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let created = client
            .create_email_template(&TemplateCreate::new(
                "review_request",
                "We'd love your feedback",
                "How did we do?",
            ))
            .await
            .unwrap();
        assert_eq!(created.status, "created");

        let templates = client.list_email_templates().await.unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[1].category.as_deref(), Some("billing"));
    }
}
