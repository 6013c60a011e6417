/*
[INPUT]:  Outbound SMS/email payloads and job ids
[OUTPUT]: Dispatch outcomes and the channels used
[POS]:    HTTP layer - customer and technician notifications
[UPDATE]: When notification routes or gateways change
*/

use reqwest::Method;

use crate::http::{Result, SurvClient};
use crate::types::{
    EmailDispatch, EmailNotification, NotificationsSent, ReminderChannels, SmsDispatch,
    SmsNotification,
};

impl SurvClient {
    /// Text a customer or dispatch a technician.
    ///
    /// POST /api/v1/notifications/sms/send
    pub async fn send_sms(&self, sms: &SmsNotification) -> Result<SmsDispatch> {
        sms.validate()?;
        let builder = self
            .request(Method::POST, "/api/v1/notifications/sms/send")?
            .json(sms);
        self.send_json(builder).await
    }

    /// POST /api/v1/notifications/email/send
    pub async fn send_email(&self, email: &EmailNotification) -> Result<EmailDispatch> {
        email.validate()?;
        let builder = self
            .request(Method::POST, "/api/v1/notifications/email/send")?
            .json(email);
        self.send_json(builder).await
    }

    /// POST /api/v1/notifications/job-reminder/{job_id}?send_sms&send_email
    pub async fn send_job_reminder(
        &self,
        job_id: &str,
        channels: ReminderChannels,
    ) -> Result<NotificationsSent> {
        let builder = self
            .request(
                Method::POST,
                &format!("/api/v1/notifications/job-reminder/{job_id}"),
            )?
            .query(&channels);
        self.send_json(builder).await
    }

    /// POST /api/v1/notifications/job-confirmation/{job_id}
    pub async fn send_job_confirmation(&self, job_id: &str) -> Result<NotificationsSent> {
        let builder = self.request(
            Method::POST,
            &format!("/api/v1/notifications/job-confirmation/{job_id}"),
        )?;
        self.send_json(builder).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::test_support::client_for;
    use crate::types::{NotificationChannel, ReminderChannels, SmsNotification};

    #[tokio::test]
    async fn test_dispatch_sms_to_technician() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/notifications/sms/send"))
            .and(body_json(json!({
                "to": "+15550199",
                "message": "New job JOB-00042 at 12 Elm St",
                "job_id": "j-42"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "mock_sent",
                "to": "+15550199",
                "message": "SMS logged (Twilio not configured)"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dispatch = client_for(&server)
            .send_sms(&SmsNotification {
                to: "+15550199".to_string(),
                message: "New job JOB-00042 at 12 Elm St".to_string(),
                job_id: Some("j-42".to_string()),
            })
            .await
            .unwrap();
        assert!(!dispatch.failed());
    }

    #[tokio::test]
    async fn test_job_reminder_sms_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/notifications/job-reminder/j-7"))
            .and(query_param("send_sms", "true"))
            .and(query_param("send_email", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "job_id": "j-7",
                "notifications_sent": ["sms"],
                "message": "Reminders sent successfully"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sent = client_for(&server)
            .send_job_reminder(
                "j-7",
                ReminderChannels {
                    send_sms: true,
                    send_email: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(sent.notifications_sent, vec![NotificationChannel::Sms]);
    }

    #[tokio::test]
    async fn test_job_confirmation_missing_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/notifications/job-confirmation/nope"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "Job not found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send_job_confirmation("nope")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.detail(), Some("Job not found"));
    }
}
