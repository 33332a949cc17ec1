//! Request payloads sent to the booking API, with the form-level checks that
//! run before anything goes over the wire.

use crate::domain::model::{Role, ServiceKind, ServiceStatus};
use crate::utils::error::{PawcareError, Result};
use crate::utils::validation::{
    validate_email, validate_min_length, validate_non_empty_string, validate_non_negative,
    validate_phone, validate_range, Validate,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<()> {
        validate_email("email", &self.email)?;
        validate_non_empty_string("password", &self.password)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("name", &self.name)?;
        validate_email("email", &self.email)?;
        validate_min_length("password", &self.password, MIN_PASSWORD_LENGTH)?;
        if let Some(phone) = &self.phone {
            validate_phone("phone", phone)?;
        }
        Ok(())
    }
}

/// Only the fields that are set are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.address.is_none()
    }
}

impl Validate for ProfileUpdate {
    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(PawcareError::ValidationError {
                message: "Nothing to update".to_string(),
            });
        }
        if let Some(name) = &self.name {
            validate_non_empty_string("name", name)?;
        }
        if let Some(email) = &self.email {
            validate_email("email", email)?;
        }
        if let Some(phone) = &self.phone {
            validate_phone("phone", phone)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PetInput {
    pub name: String,
    pub species: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for PetInput {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("name", &self.name)?;
        validate_non_empty_string("species", &self.species)?;
        if let Some(age) = self.age {
            validate_range("age", age, 0, 60)?;
        }
        if let Some(weight) = self.weight {
            validate_non_negative("weight", weight)?;
        }
        Ok(())
    }
}

/// Body of `POST /pets/`: the pet plus its owner.
#[derive(Debug, Clone, Serialize)]
pub struct NewPet<'a> {
    pub owner_id: &'a str,
    #[serde(flatten)]
    pub pet: &'a PetInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewService {
    pub service_type: ServiceKind,
    pub staff_id: String,
    pub pet_id: String,
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_hhmm")]
    pub time: NaiveTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub service_type: ServiceKind,
    pub staff_id: String,
    pub pet_id: String,
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_hhmm")]
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewInput {
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Validate for ReviewInput {
    fn validate(&self) -> Result<()> {
        validate_range("rating", self.rating, 1, 5)?;
        if let Some(comment) = &self.comment {
            if comment.chars().count() > 1000 {
                return Err(PawcareError::InvalidValueError {
                    field: "comment".to_string(),
                    value: format!("{} characters", comment.chars().count()),
                    reason: "Comment must be at most 1000 characters".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Body of `PATCH /admin/users/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Body of `PATCH /services/{id}/{status}`; the status also travels in the path.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub status: ServiceStatus,
}

fn serialize_hhmm<S: serde::Serializer>(time: &NaiveTime, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.format("%H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let mut form = RegisterRequest {
            name: "Amy".to_string(),
            email: "amy@example.com".to_string(),
            password: "secret1".to_string(),
            phone: Some("0912345678".to_string()),
            address: None,
        };
        assert!(form.validate().is_ok());

        form.password = "123".to_string();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            phone: Some("0912345678".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body, serde_json::json!({"phone": "0912345678"}));

        assert!(ProfileUpdate::default().validate().is_err());
    }

    #[test]
    fn test_new_pet_flattens_owner() {
        let pet = PetInput {
            name: "Mochi".to_string(),
            species: "cat".to_string(),
            age: Some(3),
            ..Default::default()
        };
        let body = serde_json::to_value(NewPet {
            owner_id: "u-1",
            pet: &pet,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"owner_id": "u-1", "name": "Mochi", "species": "cat", "age": 3})
        );
    }

    #[test]
    fn test_new_service_time_format() {
        let service = NewService {
            service_type: ServiceKind::Caretaker,
            staff_id: "s-1".to_string(),
            pet_id: "p-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            payment_id: None,
            note: None,
        };
        let body = serde_json::to_value(&service).unwrap();
        assert_eq!(body["time"], "14:00");
        assert_eq!(body["date"], "2025-03-01");
        assert_eq!(body["service_type"], "caretaker");
    }

    #[test]
    fn test_review_rating_range() {
        let review = ReviewInput {
            rating: 6,
            comment: None,
        };
        assert!(review.validate().is_err());
    }

    #[test]
    fn test_pet_requires_species() {
        let pet = PetInput {
            name: "Mochi".to_string(),
            ..Default::default()
        };
        assert!(pet.validate().is_err());
    }
}
