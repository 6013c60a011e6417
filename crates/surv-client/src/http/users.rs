/*
[INPUT]:  Role filter and paging, profile updates
[OUTPUT]: Staff user records and update acknowledgements
[POS]:    HTTP layer - user directory (admins and managers only)
[UPDATE]: When user routes change
*/

use reqwest::Method;

use crate::http::{Result, SurvClient};
use crate::types::{User, UserQuery, UserRole, UserUpdate, UserUpdated};

impl SurvClient {
    /// GET /api/v1/users?role_filter&skip&limit
    pub async fn list_users(&self, query: &UserQuery) -> Result<Vec<User>> {
        let builder = self.request(Method::GET, "/api/v1/users")?.query(query);
        self.send_json(builder).await
    }

    /// Dispatchable technicians
    pub async fn list_technicians(&self) -> Result<Vec<User>> {
        self.list_users(&UserQuery {
            role: Some(UserRole::Technician),
            ..UserQuery::default()
        })
        .await
    }

    /// Users may update themselves; admins and managers may update anyone.
    ///
    /// PUT /api/v1/users/{id}
    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<UserUpdated> {
        let builder = self
            .request(Method::PUT, &format!("/api/v1/users/{id}"))?
            .json(update);
        self.send_json(builder).await
    }
}
