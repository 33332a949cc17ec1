use crate::adapters::http::{api_path, ApiClient};
use crate::domain::forms::{NewPet, PetInput};
use crate::domain::model::{decode_all, Pet};
use crate::utils::error::{PawcareError, Result};
use crate::utils::fields::{as_list, unwrap_envelope};
use crate::utils::validation::{validate_non_empty_string, Validate};

pub struct PetService<'a> {
    api: &'a ApiClient,
}

impl<'a> PetService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<Pet>> {
        validate_non_empty_string("owner_id", owner_id)?;
        let body = self.api.get(&api_path(&["pets", owner_id])?).await?;
        let pets = decode_all(as_list(body, &["pets"]), Pet::from_json);
        tracing::debug!("Loaded {} pets for owner {}", pets.len(), owner_id);
        Ok(pets)
    }

    pub async fn create(&self, owner_id: &str, pet: &PetInput) -> Result<Pet> {
        pet.validate()?;
        let body = self
            .api
            .post("/pets/", &NewPet { owner_id, pet })
            .await?;
        tracing::info!("🐾 Added pet {}", pet.name);

        Pet::from_json(&unwrap_envelope(body, &["pet"])).map_err(|e| {
            PawcareError::ResponseShapeError {
                message: format!("pet was created but the response could not be read: {}", e),
            }
        })
    }

    pub async fn update(&self, pet_id: &str, pet: &PetInput) -> Result<Option<Pet>> {
        validate_non_empty_string("pet_id", pet_id)?;
        pet.validate()?;
        let body = self.api.put(&api_path(&["pets", pet_id])?, pet).await?;
        tracing::info!("🐾 Updated pet {}", pet_id);
        Ok(Pet::from_json(&unwrap_envelope(body, &["pet"])).ok())
    }

    pub async fn delete(&self, pet_id: &str) -> Result<()> {
        validate_non_empty_string("pet_id", pet_id)?;
        self.api.delete(&api_path(&["pets", pet_id])?).await?;
        tracing::info!("🗑️ Removed pet {}", pet_id);
        Ok(())
    }
}
