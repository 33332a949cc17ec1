use crate::adapters::http::{api_path, ApiClient};
use crate::domain::forms::UserPatch;
use crate::domain::model::{decode_all, AdminUser, Pet, Role, Service};
use crate::utils::error::Result;
use crate::utils::fields::as_list;
use crate::utils::validation::validate_non_empty_string;

/// Back-office operations. Callers are expected to have checked the admin role.
pub struct AdminService<'a> {
    api: &'a ApiClient,
}

impl<'a> AdminService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn users(&self) -> Result<Vec<AdminUser>> {
        let body = self.api.get("/admin/users").await?;
        Ok(decode_all(as_list(body, &["users"]), AdminUser::from_json))
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        validate_non_empty_string("user_id", user_id)?;
        self.api.delete(&api_path(&["admin", "users", user_id])?).await?;
        tracing::info!("🗑️ Deleted user {}", user_id);
        Ok(())
    }

    pub async fn set_role(&self, user_id: &str, role: Role) -> Result<()> {
        self.patch_user(
            user_id,
            &UserPatch {
                role: Some(role),
                ..Default::default()
            },
        )
        .await?;
        tracing::info!("👤 User {} is now {}", user_id, role);
        Ok(())
    }

    pub async fn set_active(&self, user_id: &str, active: bool) -> Result<()> {
        self.patch_user(
            user_id,
            &UserPatch {
                active: Some(active),
                ..Default::default()
            },
        )
        .await?;
        tracing::info!(
            "👤 User {} {}",
            user_id,
            if active { "activated" } else { "deactivated" }
        );
        Ok(())
    }

    async fn patch_user(&self, user_id: &str, patch: &UserPatch) -> Result<()> {
        validate_non_empty_string("user_id", user_id)?;
        self.api
            .patch(&api_path(&["admin", "users", user_id])?, patch)
            .await?;
        Ok(())
    }

    pub async fn services(&self) -> Result<Vec<Service>> {
        let body = self.api.get("/admin/services").await?;
        Ok(decode_all(as_list(body, &["services"]), Service::from_json))
    }

    pub async fn pets(&self) -> Result<Vec<Pet>> {
        let body = self.api.get("/admin/pets").await?;
        Ok(decode_all(as_list(body, &["pets"]), Pet::from_json))
    }

    pub async fn delete_pet(&self, pet_id: &str) -> Result<()> {
        validate_non_empty_string("pet_id", pet_id)?;
        self.api.delete(&api_path(&["admin", "pets", pet_id])?).await?;
        tracing::info!("🗑️ Deleted pet {}", pet_id);
        Ok(())
    }
}
