use crate::adapters::http::ApiClient;
use crate::app::services::{BookingService, PaymentService};
use crate::core::BookingGateway;
use crate::domain::forms::{NewService, PaymentRequest};
use crate::domain::model::{Payment, Service};
use crate::utils::error::Result;
use async_trait::async_trait;

/// `BookingGateway` backed by the REST API.
pub struct ApiGateway {
    api: ApiClient,
}

impl ApiGateway {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl BookingGateway for ApiGateway {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<Payment> {
        PaymentService::new(&self.api).create(request).await
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<Payment> {
        PaymentService::new(&self.api).fetch(payment_id).await
    }

    async fn create_service(&self, service: &NewService) -> Result<Service> {
        BookingService::new(&self.api).create(service).await
    }
}
