use crate::utils::error::{PawcareError, Result};
use crate::utils::fields::{
    probe_bool, probe_f64, probe_i64, probe_string, probe_string_list, require_string,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

const USER_ID_FIELDS: &[&str] = &["user_id", "userId", "USERID", "id", "_id"];
const OWNER_ID_FIELDS: &[&str] = &["owner_id", "ownerId", "OWNERID", "user_id", "userId"];
const PET_ID_FIELDS: &[&str] = &["PETID", "pet_id", "petId", "id", "_id"];
const SERVICE_ID_FIELDS: &[&str] = &["service_id", "serviceId", "SERVICEID", "id", "_id"];
const STAFF_ID_FIELDS: &[&str] = &[
    "staff_id",
    "staffId",
    "doctor_id",
    "doctorId",
    "caretaker_id",
    "caretakerId",
];
const NAME_FIELDS: &[&str] = &["name", "full_name", "fullName", "username", "user_name"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Doctor,
    Caretaker,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Doctor => "doctor",
            Role::Caretaker => "caretaker",
            Role::Admin => "admin",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Doctor | Role::Caretaker)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PawcareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" | "user" | "customer" | "member" => Ok(Role::Owner),
            "doctor" | "vet" | "veterinarian" => Ok(Role::Doctor),
            "caretaker" | "sitter" | "carer" => Ok(Role::Caretaker),
            "admin" | "administrator" => Ok(Role::Admin),
            other => Err(PawcareError::InvalidValueError {
                field: "role".to_string(),
                value: other.to_string(),
                reason: "Expected one of owner, doctor, caretaker, admin".to_string(),
            }),
        }
    }
}

/// The booking mode: which kind of staff member the owner is reserving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Doctor,
    Caretaker,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Doctor => "doctor",
            ServiceKind::Caretaker => "caretaker",
        }
    }

    pub fn staff_role(&self) -> Role {
        match self {
            ServiceKind::Doctor => Role::Doctor,
            ServiceKind::Caretaker => Role::Caretaker,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = PawcareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" | "vet" | "medical" | "clinic" => Ok(ServiceKind::Doctor),
            "caretaker" | "care" | "sitter" | "sitting" | "boarding" => Ok(ServiceKind::Caretaker),
            other => Err(PawcareError::InvalidValueError {
                field: "service_type".to_string(),
                value: other.to_string(),
                reason: "Expected doctor or caretaker".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 5] = [
        ServiceStatus::Pending,
        ServiceStatus::Accepted,
        ServiceStatus::Rejected,
        ServiceStatus::Completed,
        ServiceStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "pending",
            ServiceStatus::Accepted => "accepted",
            ServiceStatus::Rejected => "rejected",
            ServiceStatus::Completed => "completed",
            ServiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ServiceStatus::Rejected | ServiceStatus::Completed | ServiceStatus::Cancelled
        )
    }

    /// pending -> accepted | rejected | cancelled, accepted -> completed | cancelled.
    pub fn can_transition_to(&self, next: ServiceStatus) -> bool {
        matches!(
            (self, next),
            (ServiceStatus::Pending, ServiceStatus::Accepted)
                | (ServiceStatus::Pending, ServiceStatus::Rejected)
                | (ServiceStatus::Pending, ServiceStatus::Cancelled)
                | (ServiceStatus::Accepted, ServiceStatus::Completed)
                | (ServiceStatus::Accepted, ServiceStatus::Cancelled)
        )
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = PawcareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "waiting" | "requested" | "new" => Ok(ServiceStatus::Pending),
            "accepted" | "approved" | "confirmed" => Ok(ServiceStatus::Accepted),
            "rejected" | "declined" | "denied" => Ok(ServiceStatus::Rejected),
            "completed" | "done" | "finished" => Ok(ServiceStatus::Completed),
            "cancelled" | "canceled" => Ok(ServiceStatus::Cancelled),
            other => Err(PawcareError::InvalidValueError {
                field: "status".to_string(),
                value: other.to_string(),
                reason: "Unknown service status".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = PawcareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "unpaid" | "open" | "created" | "processing" => Ok(PaymentStatus::Pending),
            "paid" | "success" | "succeeded" | "completed" | "complete" => Ok(PaymentStatus::Paid),
            "failed" | "failure" | "error" | "expired" | "cancelled" | "canceled" => {
                Ok(PaymentStatus::Failed)
            }
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(PawcareError::InvalidValueError {
                field: "payment_status".to_string(),
                value: other.to_string(),
                reason: "Unknown payment status".to_string(),
            }),
        }
    }
}

/// Accepts `2025-03-01`, `2025-03-01T10:00:00Z` and `2025-03-01 10:00:00`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y/%m/%d").ok())
}

/// Accepts `09:30` and `09:30:00`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .ok()
        .or_else(|| NaiveTime::parse_from_str(raw, "%H:%M:%S").ok())
}

fn probe_enum<T: FromStr>(value: &Value, candidates: &[&str]) -> Option<T> {
    probe_string(value, candidates).and_then(|raw| raw.parse().ok())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
    pub avatar_url: Option<String>,
}

impl Profile {
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(Self {
            id: require_string(value, USER_ID_FIELDS, "Profile")?,
            name: probe_string(value, NAME_FIELDS).unwrap_or_default(),
            email: probe_string(value, &["email", "mail", "email_address"]),
            phone: probe_string(value, &["phone", "phone_number", "phoneNumber", "mobile"]),
            address: probe_string(value, &["address", "addr", "location"]),
            role: probe_enum(value, &["role", "user_role", "userRole", "type"]),
            avatar_url: probe_string(value, &["avatar", "avatar_url", "avatarUrl", "photo"]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub owner_id: Option<String>,
    pub name: String,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub age: Option<u32>,
    pub weight: Option<f64>,
    pub notes: Option<String>,
}

impl Pet {
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(Self {
            id: require_string(value, PET_ID_FIELDS, "Pet")?,
            owner_id: probe_string(value, OWNER_ID_FIELDS),
            name: probe_string(value, &["name", "pet_name", "petName", "PETNAME"])
                .unwrap_or_default(),
            species: probe_string(value, &["species", "type", "kind", "category"]),
            breed: probe_string(value, &["breed", "variety"]),
            age: probe_i64(value, &["age", "pet_age", "petAge"])
                .and_then(|age| u32::try_from(age).ok()),
            weight: probe_f64(value, &["weight", "pet_weight", "petWeight"]),
            notes: probe_string(value, &["notes", "note", "description", "remark"]),
        })
    }
}

/// A booking between an owner and a staff member. The API calls these "services".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub owner_id: Option<String>,
    pub staff_id: Option<String>,
    pub staff_name: Option<String>,
    pub pet_id: Option<String>,
    pub kind: Option<ServiceKind>,
    pub status: ServiceStatus,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub price: Option<f64>,
    pub note: Option<String>,
}

impl Service {
    pub fn from_json(value: &Value) -> Result<Self> {
        let status = match probe_string(value, &["status", "service_status", "serviceStatus", "state"]) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("⚠️ Unknown service status '{}', treating as pending", raw);
                ServiceStatus::Pending
            }),
            None => ServiceStatus::Pending,
        };

        let date_fields = &["date", "service_date", "serviceDate", "scheduled_at", "scheduledAt"];
        let raw_date = probe_string(value, date_fields);
        let time = probe_string(value, &["time", "service_time", "serviceTime", "slot"])
            .and_then(|raw| parse_time(&raw))
            .or_else(|| {
                // scheduled_at 有時帶著時間
                raw_date
                    .as_deref()
                    .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
                    .map(|dt| dt.time())
            });

        Ok(Self {
            id: require_string(value, SERVICE_ID_FIELDS, "Service")?,
            owner_id: probe_string(value, OWNER_ID_FIELDS),
            staff_id: probe_string(value, STAFF_ID_FIELDS),
            staff_name: probe_string(
                value,
                &["staff_name", "staffName", "doctor_name", "caretaker_name", "staff.name"],
            ),
            pet_id: probe_string(value, &["pet_id", "petId", "PETID", "pet.id"]),
            kind: probe_enum(value, &["service_type", "serviceType", "type", "mode", "kind"]),
            status,
            date: raw_date.as_deref().and_then(parse_date),
            time,
            price: probe_f64(value, &["price", "amount", "fee", "cost"]),
            note: probe_string(value, &["note", "notes", "description", "remark"]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub service_id: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub status: PaymentStatus,
    pub checkout_url: Option<String>,
}

impl Payment {
    pub fn from_json(value: &Value) -> Result<Self> {
        let status = match probe_string(value, &["status", "payment_status", "paymentStatus", "state"]) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("⚠️ Unknown payment status '{}', treating as pending", raw);
                PaymentStatus::Pending
            }),
            None => PaymentStatus::Pending,
        };

        Ok(Self {
            id: require_string(
                value,
                &["payment_id", "paymentId", "PAYMENTID", "id", "_id", "session_id"],
                "Payment",
            )?,
            service_id: probe_string(value, &["service_id", "serviceId", "SERVICEID"]),
            amount: probe_f64(value, &["amount", "price", "total"]),
            currency: probe_string(value, &["currency"]),
            status,
            checkout_url: probe_string(
                value,
                &["checkout_url", "checkoutUrl", "url", "redirect_url", "redirectUrl", "payment_url"],
            ),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Option<String>,
    pub service_id: Option<String>,
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub author_id: Option<String>,
}

impl Review {
    pub fn from_json(value: &Value) -> Result<Self> {
        let review = Self {
            id: probe_string(value, &["review_id", "reviewId", "REVIEWID", "id"]),
            service_id: probe_string(value, &["service_id", "serviceId", "SERVICEID"]),
            rating: probe_i64(value, &["rating", "score", "stars"])
                .and_then(|r| u8::try_from(r).ok()),
            comment: probe_string(value, &["comment", "content", "review", "text"]),
            author_id: probe_string(value, &["author_id", "authorId", "owner_id", "user_id"]),
        };
        if review.rating.is_none() && review.comment.is_none() {
            return Err(PawcareError::ResponseShapeError {
                message: "Review has neither rating nor comment".to_string(),
            });
        }
        Ok(review)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub active: bool,
    pub created_at: Option<String>,
}

impl AdminUser {
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(Self {
            id: require_string(value, USER_ID_FIELDS, "User")?,
            name: probe_string(value, NAME_FIELDS).unwrap_or_default(),
            email: probe_string(value, &["email", "mail"]),
            role: probe_enum(value, &["role", "user_role", "userRole", "type"]),
            active: probe_bool(value, &["active", "is_active", "isActive", "enabled", "status"])
                .unwrap_or(true),
            created_at: probe_string(value, &["created_at", "createdAt", "joined_at"]),
        })
    }
}

/// A doctor or caretaker offered in the staff/time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub role: Option<Role>,
    pub available_times: Vec<NaiveTime>,
    pub booked_times: Vec<NaiveDateTime>,
}

impl StaffMember {
    pub fn from_json(value: &Value) -> Result<Self> {
        let available_times = probe_string_list(
            value,
            &["available_times", "availableTimes", "times", "slots"],
        )
        .iter()
        .filter_map(|raw| parse_time(raw))
        .collect();

        let booked_times = probe_string_list(value, &["booked_times", "bookedTimes", "booked"])
            .iter()
            .filter_map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.naive_local())
                    .ok()
                    .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").ok())
                    .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").ok())
            })
            .collect();

        let mut ids: Vec<&str> = STAFF_ID_FIELDS.to_vec();
        ids.extend_from_slice(USER_ID_FIELDS);

        Ok(Self {
            id: require_string(value, &ids, "Staff member")?,
            name: probe_string(value, NAME_FIELDS).unwrap_or_default(),
            role: probe_enum(value, &["role", "user_role", "userRole", "type"]),
            available_times,
            booked_times,
        })
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Decodes every item, skipping (and logging) records that cannot be read.
pub fn decode_all<T>(items: Vec<Value>, decode: fn(&Value) -> Result<T>) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| match decode(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("⚠️ Skipping unreadable record: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pet_id_fallbacks() {
        for key in ["PETID", "pet_id", "petId", "id"] {
            let pet = Pet::from_json(&json!({ key: 12, "name": "Mochi" })).unwrap();
            assert_eq!(pet.id, "12", "key {}", key);
            assert_eq!(pet.name, "Mochi");
        }
    }

    #[test]
    fn test_profile_user_id_fallbacks() {
        for key in ["user_id", "userId", "id"] {
            let profile = Profile::from_json(&json!({ key: "u-1", "fullName": "Amy Lin" })).unwrap();
            assert_eq!(profile.id, "u-1");
            assert_eq!(profile.name, "Amy Lin");
        }
        assert!(Profile::from_json(&json!({"name": "nobody"})).is_err());
    }

    #[test]
    fn test_service_decoding() {
        let service = Service::from_json(&json!({
            "serviceId": 5,
            "ownerId": 1,
            "doctor_id": 9,
            "serviceType": "doctor",
            "status": "Approved",
            "scheduled_at": "2025-03-01T10:00:00+08:00",
            "price": "800"
        }))
        .unwrap();

        assert_eq!(service.id, "5");
        assert_eq!(service.staff_id.as_deref(), Some("9"));
        assert_eq!(service.kind, Some(ServiceKind::Doctor));
        assert_eq!(service.status, ServiceStatus::Accepted);
        assert_eq!(service.date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(service.time, NaiveTime::from_hms_opt(10, 0, 0));
        assert_eq!(service.price, Some(800.0));
    }

    #[test]
    fn test_unknown_service_status_defaults_to_pending() {
        let service = Service::from_json(&json!({"id": 1, "status": "???"})).unwrap();
        assert_eq!(service.status, ServiceStatus::Pending);
    }

    #[test]
    fn test_status_transitions() {
        assert!(ServiceStatus::Pending.can_transition_to(ServiceStatus::Accepted));
        assert!(ServiceStatus::Accepted.can_transition_to(ServiceStatus::Completed));
        assert!(!ServiceStatus::Pending.can_transition_to(ServiceStatus::Completed));
        assert!(!ServiceStatus::Completed.can_transition_to(ServiceStatus::Cancelled));
        assert!(ServiceStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_payment_decoding() {
        let payment = Payment::from_json(&json!({
            "paymentId": "pay_1",
            "payment_status": "succeeded",
            "redirect_url": "https://checkout.example.com/pay_1",
            "total": 500
        }))
        .unwrap();
        assert_eq!(payment.id, "pay_1");
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(
            payment.checkout_url.as_deref(),
            Some("https://checkout.example.com/pay_1")
        );
        assert_eq!(payment.amount, Some(500.0));
    }

    #[test]
    fn test_admin_user_active_defaults_true() {
        let user = AdminUser::from_json(&json!({"id": 3, "name": "Ben", "role": "vet"})).unwrap();
        assert!(user.active);
        assert_eq!(user.role, Some(Role::Doctor));

        let user = AdminUser::from_json(&json!({"id": 3, "is_active": false})).unwrap();
        assert!(!user.active);
    }

    #[test]
    fn test_staff_member_times() {
        let staff = StaffMember::from_json(&json!({
            "doctorId": 4,
            "name": "Dr. Chen",
            "availableTimes": ["09:00", "10:00", "bogus"],
            "booked": ["2025-03-01 09:00"]
        }))
        .unwrap();
        assert_eq!(staff.id, "4");
        assert_eq!(staff.available_times.len(), 2);
        assert_eq!(staff.booked_times.len(), 1);
    }

    #[test]
    fn test_review_requires_content() {
        assert!(Review::from_json(&json!({"id": 1})).is_err());
        let review = Review::from_json(&json!({"score": 4, "content": "great"})).unwrap();
        assert_eq!(review.rating, Some(4));
        assert_eq!(review.comment.as_deref(), Some("great"));
    }

    #[test]
    fn test_decode_all_skips_bad_records() {
        let pets = decode_all(
            vec![json!({"id": 1, "name": "a"}), json!({"name": "no id"})],
            Pet::from_json,
        );
        assert_eq!(pets.len(), 1);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Customer".parse::<Role>().unwrap(), Role::Owner);
        assert_eq!("caretaker".parse::<Role>().unwrap(), Role::Caretaker);
        assert!("king".parse::<Role>().is_err());
    }
}
