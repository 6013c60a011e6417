/*
[INPUT]:  Invoice payment requests (card intents and manual records)
[OUTPUT]: Payment intents, confirmations and updated invoice totals
[POS]:    HTTP layer - payment endpoints (require bearer auth)
[UPDATE]: When the payment processor integration changes
*/

use reqwest::Method;

use crate::http::{Result, SurvClient};
use crate::types::{
    ManualPayment, PaymentConfirm, PaymentConfirmation, PaymentIntent, PaymentIntentCreate,
    PaymentReceipt,
};

impl SurvClient {
    /// POST /api/v1/payments/create-payment-intent
    pub async fn create_payment_intent(&self, payment: &PaymentIntentCreate) -> Result<PaymentIntent> {
        payment.validate()?;
        let builder = self
            .request(Method::POST, "/api/v1/payments/create-payment-intent")?
            .json(payment);
        self.send_json(builder).await
    }

    /// Mark the invoice paid in full once the card payment went through.
    ///
    /// POST /api/v1/payments/confirm-payment
    pub async fn confirm_payment(&self, confirm: &PaymentConfirm) -> Result<PaymentConfirmation> {
        let builder = self
            .request(Method::POST, "/api/v1/payments/confirm-payment")?
            .json(confirm);
        self.send_json(builder).await
    }

    /// Cash, check or ACH. Fields travel as query parameters.
    ///
    /// POST /api/v1/payments/record-payment?invoice_id&amount&payment_method&notes
    pub async fn record_payment(&self, payment: &ManualPayment) -> Result<PaymentReceipt> {
        payment.validate()?;
        let builder = self
            .request(Method::POST, "/api/v1/payments/record-payment")?
            .query(payment);
        self.send_json(builder).await
    }

    /// Intent then confirmation, as the card checkout does
    pub async fn pay_by_card(&self, payment: &PaymentIntentCreate) -> Result<PaymentConfirmation> {
        let intent = self.create_payment_intent(payment).await?;
        self.confirm_payment(&PaymentConfirm {
            payment_intent_id: intent.client_secret,
            invoice_id: intent.invoice_id,
        })
        .await
    }
}
