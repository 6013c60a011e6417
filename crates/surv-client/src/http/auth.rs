/*
[INPUT]:  Lemma verification payloads and the stored bearer token
[OUTPUT]: Lemma configuration, issued sessions, current user
[POS]:    HTTP layer - authentication endpoints
[UPDATE]: When backend auth routes change
*/

use reqwest::Method;

use crate::http::{Result, SurvClient};
use crate::types::{LemmaConfigResponse, LemmaVerifyRequest, TokenResponse, User};

impl SurvClient {
    /// Public Lemma configuration.
    ///
    /// GET /api/v1/auth/lemma-config
    pub async fn lemma_config(&self) -> Result<LemmaConfigResponse> {
        let builder = self.request(Method::GET, "/api/v1/auth/lemma-config")?;
        self.send_json(builder).await
    }

    /// Exchange a verified PPID for a backend session.
    ///
    /// POST /api/v1/auth/lemma-verify
    ///
    /// A 404 means no account exists for this identity and
    /// `create_account` was false.
    pub async fn lemma_verify(&self, request: &LemmaVerifyRequest) -> Result<TokenResponse> {
        let builder = self
            .request(Method::POST, "/api/v1/auth/lemma-verify")?
            .json(request);
        self.send_json(builder).await
    }

    /// GET /api/v1/auth/me
    pub async fn me(&self) -> Result<User> {
        let builder = self.request(Method::GET, "/api/v1/auth/me")?;
        self.send_json(builder).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::test_support::{client_for, user_json};
    use crate::types::{LemmaVerifyRequest, UserRole};

    #[tokio::test]
    async fn test_lemma_config_unconfigured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/lemma-config"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"configured": false, "site_id": null})),
            )
            .mount(&server)
            .await;

        let config = client_for(&server).lemma_config().await.unwrap();
        assert!(!config.configured);
        assert_eq!(config.site_id(), None);
    }

    #[tokio::test]
    async fn test_lemma_verify_posts_wallet_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/lemma-verify"))
            .and(body_partial_json(json!({
                "user_did": "ppid-abcdefgh12345678",
                "user_email": "12345678@wallet.lemma.id",
                "create_account": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-1",
                "token_type": "bearer",
                "user": user_json("u-9", "manager"),
                "verification_method": "lemma"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = LemmaVerifyRequest::for_ppid("ppid-abcdefgh12345678", vec![], vec![]);
        let token = client_for(&server).lemma_verify(&request).await.unwrap();

        assert_eq!(token.access_token, "jwt-1");
        assert_eq!(token.user.role, UserRole::Manager);
    }

    #[tokio::test]
    async fn test_lemma_verify_unknown_account_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/lemma-verify"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "detail": "No account found. Set create_account=true to create one."
            })))
            .mount(&server)
            .await;

        let request = LemmaVerifyRequest::for_ppid("ppid-1", vec![], vec![]);
        let err = client_for(&server).lemma_verify(&request).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
