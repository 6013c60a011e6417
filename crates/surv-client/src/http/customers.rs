/*
[INPUT]:  Customer form payloads and search parameters
[OUTPUT]: Customer records
[POS]:    HTTP layer - customer endpoints (require bearer auth)
[UPDATE]: When adding customer endpoints or changing search behavior
*/

use reqwest::Method;

use crate::http::{Result, SurvClient};
use crate::types::{Customer, CustomerInput};

impl SurvClient {
    /// List customers, optionally filtered server-side.
    ///
    /// GET /api/v1/customers?search={search}&skip={skip}&limit={limit}
    pub async fn list_customers(
        &self,
        search: Option<&str>,
        skip: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<Customer>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(skip) = skip {
            params.push(("skip", skip.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }

        let builder = self.request(Method::GET, "/api/v1/customers")?.query(&params);
        self.send_json(builder).await
    }

    /// GET /api/v1/customers/{id}
    pub async fn get_customer(&self, id: &str) -> Result<Customer> {
        let builder = self.request(Method::GET, &format!("/api/v1/customers/{id}"))?;
        self.send_json(builder).await
    }

    /// POST /api/v1/customers
    pub async fn create_customer(&self, input: &CustomerInput) -> Result<Customer> {
        input.validate()?;
        let builder = self.request(Method::POST, "/api/v1/customers")?.json(input);
        self.send_json(builder).await
    }

    /// PUT /api/v1/customers/{id}
    pub async fn update_customer(&self, id: &str, input: &CustomerInput) -> Result<Customer> {
        input.validate()?;
        let builder = self
            .request(Method::PUT, &format!("/api/v1/customers/{id}"))?
            .json(input);
        self.send_json(builder).await
    }

    /// DELETE /api/v1/customers/{id}
    pub async fn delete_customer(&self, id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("/api/v1/customers/{id}"))?;
        self.send_empty(builder).await
    }
}

/// Client-side search over an already loaded list
pub fn filter_customers<'a>(customers: &'a [Customer], query: &str) -> Vec<&'a Customer> {
    customers.iter().filter(|c| c.matches(query)).collect()
}
