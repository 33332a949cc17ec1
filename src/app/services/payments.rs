use crate::adapters::http::{api_path, ApiClient};
use crate::domain::forms::PaymentRequest;
use crate::domain::model::{decode_all, Payment};
use crate::utils::error::Result;
use crate::utils::fields::{as_list, unwrap_envelope};
use crate::utils::validation::{validate_non_empty_string, validate_non_negative};

pub struct PaymentService<'a> {
    api: &'a ApiClient,
}

impl<'a> PaymentService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Opens a checkout session. The returned payment carries the redirect URL.
    pub async fn create(&self, request: &PaymentRequest) -> Result<Payment> {
        validate_non_negative("amount", request.amount)?;
        let body = self.api.post("/payments/", request).await?;
        let payment = Payment::from_json(&unwrap_envelope(body, &["payment", "session"]))?;
        tracing::info!(
            "💳 Opened payment {} for {:.0} {}",
            payment.id,
            request.amount,
            request.currency
        );
        Ok(payment)
    }

    pub async fn list(&self) -> Result<Vec<Payment>> {
        let body = self.api.get("/payments/").await?;
        Ok(decode_all(as_list(body, &["payments"]), Payment::from_json))
    }

    pub async fn fetch(&self, payment_id: &str) -> Result<Payment> {
        validate_non_empty_string("payment_id", payment_id)?;
        let body = self.api.get(&api_path(&["payments", payment_id])?).await?;
        Payment::from_json(&unwrap_envelope(body, &["payment"]))
    }
}
