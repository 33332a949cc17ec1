use crate::adapters::http::{api_path, ApiClient};
use crate::domain::forms::{NewService, ReviewInput, StatusChange};
use crate::domain::model::{decode_all, Review, Service, ServiceKind, ServiceStatus, StaffMember};
use crate::utils::error::Result;
use crate::utils::fields::{as_list, unwrap_envelope};
use crate::utils::validation::{validate_non_empty_string, Validate};

/// Reservations. The API names them "services".
pub struct BookingService<'a> {
    api: &'a ApiClient,
}

impl<'a> BookingService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// The API scopes the list to whoever owns the token.
    pub async fn list(&self) -> Result<Vec<Service>> {
        let body = self.api.get("/services").await?;
        Ok(decode_all(as_list(body, &["services"]), Service::from_json))
    }

    pub async fn staff(&self, kind: ServiceKind) -> Result<Vec<StaffMember>> {
        let body = self.api.get(&api_path(&["user", "staff", kind.as_str()])?).await?;
        let staff = decode_all(
            as_list(body, &["staff", "users", kind.as_str(), "doctors", "caretakers"]),
            StaffMember::from_json,
        );
        tracing::debug!("Loaded {} {} staff members", staff.len(), kind);
        Ok(staff)
    }

    pub async fn create(&self, service: &NewService) -> Result<Service> {
        let body = self.api.post("/services", service).await?;
        let created = Service::from_json(&unwrap_envelope(body, &["service"]))?;
        tracing::info!("📅 Created {} service {}", service.service_type, created.id);
        Ok(created)
    }

    pub async fn change_status(&self, service_id: &str, status: ServiceStatus) -> Result<()> {
        validate_non_empty_string("service_id", service_id)?;
        self.api
            .patch(
                &api_path(&["services", service_id, status.as_str()])?,
                &StatusChange { status },
            )
            .await?;
        tracing::info!("📅 Service {} is now {}", service_id, status);
        Ok(())
    }

    pub async fn submit_review(&self, service_id: &str, review: &ReviewInput) -> Result<()> {
        validate_non_empty_string("service_id", service_id)?;
        review.validate()?;
        self.api
            .post(&api_path(&["services", "review", service_id])?, review)
            .await?;
        tracing::info!("⭐ Reviewed service {} with {} stars", service_id, review.rating);
        Ok(())
    }

    pub async fn reviews(&self, service_id: &str) -> Result<Vec<Review>> {
        validate_non_empty_string("service_id", service_id)?;
        let body = self
            .api
            .get(&api_path(&["services", "review", service_id])?)
            .await?;
        Ok(decode_all(as_list(body, &["reviews", "review"]), Review::from_json))
    }
}
