/*
[INPUT]:  Time entry payloads and date-range filters
[OUTPUT]: Time entries
[POS]:    HTTP layer - time tracking endpoints (require bearer auth)
[UPDATE]: When time tracking routes change
*/

use reqwest::Method;

use crate::http::{Result, SurvClient};
use crate::types::{TimeEntry, TimeEntryCreate, TimeQuery};

impl SurvClient {
    /// GET /api/v1/time-tracking?employee_id&date_from&date_to&skip&limit
    pub async fn list_time_entries(&self, query: &TimeQuery) -> Result<Vec<TimeEntry>> {
        let builder = self.request(Method::GET, "/api/v1/time-tracking")?.query(query);
        self.send_json(builder).await
    }

    /// Entries are append-only; there is no update or delete.
    ///
    /// POST /api/v1/time-tracking
    pub async fn create_time_entry(&self, entry: &TimeEntryCreate) -> Result<TimeEntry> {
        let builder = self.request(Method::POST, "/api/v1/time-tracking")?.json(entry);
        self.send_json(builder).await
    }
}
