/*
[INPUT]:  Service type, date windows and customer booking requests
[OUTPUT]: Bookable services, open time slots, booking confirmations
[POS]:    HTTP layer - public online booking (no auth required)
[UPDATE]: When the booking widget contract changes
*/

use reqwest::Method;
use serde::Deserialize;

use crate::http::{Result, SurvClient};
use crate::types::{
    AvailabilityQuery, AvailabilitySlot, BookingConfirmation, BookingRequest, BookingService,
};

#[derive(Deserialize)]
struct ServiceList {
    #[serde(default)]
    services: Vec<BookingService>,
}

impl SurvClient {
    /// GET /api/v1/booking/services
    pub async fn booking_services(&self) -> Result<Vec<BookingService>> {
        let builder = self.request(Method::GET, "/api/v1/booking/services")?;
        let list: ServiceList = self.send_json(builder).await?;
        Ok(list.services)
    }

    /// One slot per day and start time in the window, booked or not.
    ///
    /// GET /api/v1/booking/availability?service_type&start_date&end_date
    pub async fn booking_availability(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<Vec<AvailabilitySlot>> {
        query.validate()?;
        let builder = self
            .request(Method::GET, "/api/v1/booking/availability")?
            .query(query);
        self.send_json(builder).await
    }

    /// POST /api/v1/booking/submit
    pub async fn submit_booking(&self, booking: &BookingRequest) -> Result<BookingConfirmation> {
        booking.validate()?;
        let builder = self
            .request(Method::POST, "/api/v1/booking/submit")?
            .json(booking);
        self.send_json(builder).await
    }
}
