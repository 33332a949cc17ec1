use crate::adapters::http::ApiClient;
use crate::domain::forms::ProfileUpdate;
use crate::domain::model::Profile;
use crate::utils::error::Result;
use crate::utils::fields::unwrap_envelope;
use crate::utils::validation::Validate;

pub struct ProfileService<'a> {
    api: &'a ApiClient,
}

impl<'a> ProfileService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn fetch(&self) -> Result<Profile> {
        let body = self.api.get("/user/").await?;
        Profile::from_json(&unwrap_envelope(body, &["user", "profile"]))
    }

    /// Some deployments answer the update with the new profile, others with a
    /// bare acknowledgement; in the latter case the profile is re-fetched.
    pub async fn update(&self, update: &ProfileUpdate) -> Result<Profile> {
        update.validate()?;
        let body = self.api.put("/user/", update).await?;

        match Profile::from_json(&unwrap_envelope(body, &["user", "profile"])) {
            Ok(profile) => Ok(profile),
            Err(_) => {
                tracing::debug!("Profile update returned no profile, re-fetching");
                self.fetch().await
            }
        }
    }
}
