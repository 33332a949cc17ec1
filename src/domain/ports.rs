use crate::domain::forms::{NewService, PaymentRequest};
use crate::domain::model::{Payment, Service};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Key/value persistence for client-side state (the session and the booking draft).
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn state_dir(&self) -> &str;
    fn request_timeout_secs(&self) -> u64;
    fn extra_headers(&self) -> &HashMap<String, String>;
}

/// What the reservation flow needs from the outside world.
#[async_trait]
pub trait BookingGateway: Send + Sync {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<Payment>;
    async fn fetch_payment(&self, payment_id: &str) -> Result<Payment>;
    async fn create_service(&self, service: &NewService) -> Result<Service>;
}
