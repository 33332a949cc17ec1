use crate::core::calendar::{open_slots, BookingRules};
use crate::core::{BookingGateway, ServiceKind, Storage};
use crate::domain::forms::{NewService, PaymentRequest};
use crate::domain::model::{PaymentStatus, StaffMember};
use crate::utils::error::{PawcareError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

const DRAFT_FILE: &str = "reservation.json";

/// The in-progress booking, persisted between invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationDraft {
    pub mode: Option<ServiceKind>,
    pub pet_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub staff_id: Option<String>,
    pub staff_name: Option<String>,
    pub time: Option<NaiveTime>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub payment_id: Option<String>,
    pub checkout_url: Option<String>,
    pub service_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlowStep {
    Mode,
    Calendar,
    Staff,
    Payment,
    Verification,
    Done,
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowStep::Mode => "choose a service type",
            FlowStep::Calendar => "pick a date",
            FlowStep::Staff => "pick a staff member and time",
            FlowStep::Payment => "pay",
            FlowStep::Verification => "verify the payment",
            FlowStep::Done => "done",
        };
        f.write_str(name)
    }
}

impl ReservationDraft {
    /// The step is derived from which fields are filled in.
    pub fn step(&self) -> FlowStep {
        if self.service_id.is_some() {
            FlowStep::Done
        } else if self.payment_id.is_some() {
            FlowStep::Verification
        } else if self.staff_id.is_some() && self.time.is_some() {
            FlowStep::Payment
        } else if self.date.is_some() {
            FlowStep::Staff
        } else if self.mode.is_some() {
            FlowStep::Calendar
        } else {
            FlowStep::Mode
        }
    }

    fn clear_from_date(&mut self) {
        self.date = None;
        self.clear_from_staff();
    }

    fn clear_from_staff(&mut self) {
        self.staff_id = None;
        self.staff_name = None;
        self.time = None;
        self.clear_payment();
    }

    fn clear_payment(&mut self) {
        self.amount = None;
        self.currency = None;
        self.payment_id = None;
        self.checkout_url = None;
        self.service_id = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// Paid and the service has been created.
    Confirmed { service_id: String },
    /// The checkout has not been completed yet.
    StillPending { checkout_url: Option<String> },
}

/// Drives the booking steps: mode -> calendar -> staff/time -> payment -> verification.
///
/// Every selection is written through to storage so the flow can be resumed.
/// Changing an earlier step discards everything after it.
pub struct ReservationFlow<S: Storage, G: BookingGateway> {
    storage: S,
    gateway: G,
    rules: BookingRules,
}

impl<S: Storage, G: BookingGateway> ReservationFlow<S, G> {
    pub fn new(storage: S, gateway: G, rules: BookingRules) -> Self {
        Self {
            storage,
            gateway,
            rules,
        }
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    pub async fn draft(&self) -> Result<ReservationDraft> {
        match self.storage.read_file(DRAFT_FILE).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(draft) => Ok(draft),
                Err(e) => {
                    tracing::warn!("⚠️ Discarding unreadable reservation draft: {}", e);
                    Ok(ReservationDraft::default())
                }
            },
            Err(e) if e.is_not_found() => Ok(ReservationDraft::default()),
            Err(e) => Err(e),
        }
    }

    async fn save(&self, draft: &ReservationDraft) -> Result<()> {
        let data = serde_json::to_vec_pretty(draft)?;
        self.storage.write_file(DRAFT_FILE, &data).await
    }

    pub async fn reset(&self) -> Result<()> {
        match self.storage.remove_file(DRAFT_FILE).await {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }?;
        tracing::info!("🧹 Reservation draft cleared");
        Ok(())
    }

    fn ensure_unpaid(draft: &ReservationDraft) -> Result<()> {
        match draft.step() {
            FlowStep::Verification => Err(flow_error(
                "a payment is already open, verify it or reset the reservation",
            )),
            FlowStep::Done => Err(flow_error(
                "this reservation is already booked, reset to start a new one",
            )),
            _ => Ok(()),
        }
    }

    pub async fn select_mode(&self, mode: ServiceKind) -> Result<ReservationDraft> {
        let mut draft = self.draft().await?;
        Self::ensure_unpaid(&draft)?;

        if draft.mode != Some(mode) {
            draft.clear_from_date();
        }
        draft.mode = Some(mode);
        self.save(&draft).await?;
        tracing::info!("📝 Reservation mode: {}", mode);
        Ok(draft)
    }

    pub async fn select_pet(&self, pet_id: &str) -> Result<ReservationDraft> {
        if pet_id.trim().is_empty() {
            return Err(PawcareError::MissingFieldError {
                field: "pet_id".to_string(),
            });
        }
        let mut draft = self.draft().await?;
        Self::ensure_unpaid(&draft)?;

        draft.pet_id = Some(pet_id.trim().to_string());
        self.save(&draft).await?;
        tracing::info!("📝 Reservation pet: {}", pet_id);
        Ok(draft)
    }

    pub async fn select_date(&self, date: NaiveDate, now: NaiveDateTime) -> Result<ReservationDraft> {
        let mut draft = self.draft().await?;
        Self::ensure_unpaid(&draft)?;
        if draft.mode.is_none() {
            return Err(flow_error("choose doctor or caretaker before picking a date"));
        }

        let today = now.date();
        if !self.rules.is_bookable_date(date, today) {
            return Err(PawcareError::InvalidValueError {
                field: "date".to_string(),
                value: date.to_string(),
                reason: format!(
                    "Pick a date between {} and {}",
                    today,
                    self.rules.last_bookable_date(today)
                ),
            });
        }

        if draft.date != Some(date) {
            draft.clear_from_staff();
        }
        draft.date = Some(date);
        self.save(&draft).await?;
        tracing::info!("📝 Reservation date: {}", date);
        Ok(draft)
    }

    /// Slots the given staff member still has open on the selected date.
    pub async fn available_slots(
        &self,
        staff: Option<&StaffMember>,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveTime>> {
        let draft = self.draft().await?;
        let date = draft
            .date
            .ok_or_else(|| flow_error("pick a date before choosing a time"))?;
        Ok(open_slots(&self.rules, date, now, staff))
    }

    pub async fn select_staff_time(
        &self,
        staff: &StaffMember,
        time: NaiveTime,
        now: NaiveDateTime,
    ) -> Result<ReservationDraft> {
        let mut draft = self.draft().await?;
        Self::ensure_unpaid(&draft)?;
        let date = draft
            .date
            .ok_or_else(|| flow_error("pick a date before choosing staff and time"))?;

        if let (Some(mode), Some(role)) = (draft.mode, staff.role) {
            if role != mode.staff_role() {
                return Err(flow_error(&format!(
                    "{} is a {}, but this reservation is for a {}",
                    staff.display_name(),
                    role,
                    mode
                )));
            }
        }

        let slots = open_slots(&self.rules, date, now, Some(staff));
        if !slots.contains(&time) {
            return Err(PawcareError::InvalidValueError {
                field: "time".to_string(),
                value: time.format("%H:%M").to_string(),
                reason: format!(
                    "{} is not available then on {}; open slots: {}",
                    staff.display_name(),
                    date,
                    format_slots(&slots)
                ),
            });
        }

        draft.clear_payment();
        draft.staff_id = Some(staff.id.clone());
        draft.staff_name = Some(staff.display_name().to_string());
        draft.time = Some(time);
        self.save(&draft).await?;
        tracing::info!(
            "📝 Reservation staff: {} at {}",
            staff.display_name(),
            time.format("%H:%M")
        );
        Ok(draft)
    }

    /// Opens a checkout for the draft. Calling it again while the payment is
    /// open returns the same draft instead of opening a second checkout.
    ///
    /// The draft may be days old, so the chosen slot is checked against `now`
    /// again before any money is asked for.
    pub async fn begin_payment(&self, now: NaiveDateTime) -> Result<ReservationDraft> {
        let mut draft = self.draft().await?;
        match draft.step() {
            FlowStep::Verification => {
                tracing::info!("💳 Payment already open, reusing it");
                return Ok(draft);
            }
            FlowStep::Payment => {}
            FlowStep::Done => {
                return Err(flow_error("this reservation is already booked"));
            }
            step => {
                return Err(flow_error(&format!("cannot pay yet, next step: {}", step)));
            }
        }

        let request = payment_request(&draft, &self.rules)?;
        let today = now.date();
        let starts_at = request.date.and_time(request.time);
        if !self.rules.is_bookable_date(request.date, today) || starts_at <= now {
            return Err(PawcareError::InvalidValueError {
                field: "date".to_string(),
                value: format!("{} {}", request.date, request.time.format("%H:%M")),
                reason: format!(
                    "This slot is no longer bookable, pick a date between {} and {} and a new time",
                    today,
                    self.rules.last_bookable_date(today)
                ),
            });
        }

        let payment = self.gateway.create_payment(&request).await?;
        if payment.checkout_url.is_none() {
            tracing::warn!("⚠️ Payment {} has no checkout URL", payment.id);
        }

        draft.amount = Some(request.amount);
        draft.currency = Some(request.currency);
        draft.payment_id = Some(payment.id);
        draft.checkout_url = payment.checkout_url;
        self.save(&draft).await?;
        Ok(draft)
    }

    /// Checks the open payment. Once it is paid the service is created and the
    /// draft is marked done; a failed payment is dropped so it can be retried.
    pub async fn verify(&self) -> Result<Verification> {
        let mut draft = self.draft().await?;
        if let Some(service_id) = &draft.service_id {
            return Ok(Verification::Confirmed {
                service_id: service_id.clone(),
            });
        }
        let payment_id = draft
            .payment_id
            .clone()
            .ok_or_else(|| flow_error("there is no payment to verify"))?;

        let payment = self.gateway.fetch_payment(&payment_id).await?;
        match payment.status {
            PaymentStatus::Paid => {
                let new_service = new_service(&draft, Some(payment_id))?;
                let service = self.gateway.create_service(&new_service).await?;
                draft.service_id = Some(service.id.clone());
                if let Err(e) = self.save(&draft).await {
                    tracing::error!(
                        "❌ Service {} was created but the draft could not be saved: {}",
                        service.id,
                        e
                    );
                    return Err(flow_error(&format!(
                        "service {} was booked but could not be recorded locally ({}); \
                         check `pawcare services list` and run `pawcare reserve reset` instead of verifying again",
                        service.id, e
                    )));
                }
                tracing::info!("✅ Reservation confirmed as service {}", service.id);
                Ok(Verification::Confirmed {
                    service_id: service.id,
                })
            }
            PaymentStatus::Pending => Ok(Verification::StillPending {
                checkout_url: draft.checkout_url.clone(),
            }),
            status @ (PaymentStatus::Failed | PaymentStatus::Refunded) => {
                draft.clear_payment();
                self.save(&draft).await?;
                tracing::warn!("⚠️ Payment {} is {}", payment_id, status);
                Err(flow_error(&format!(
                    "payment {} is {}, run `pawcare reserve pay` to try again",
                    payment_id, status
                )))
            }
        }
    }
}

fn flow_error(message: &str) -> PawcareError {
    PawcareError::FlowError {
        message: message.to_string(),
    }
}

pub fn format_slots(slots: &[NaiveTime]) -> String {
    if slots.is_empty() {
        return "none".to_string();
    }
    slots
        .iter()
        .map(|slot| slot.format("%H:%M").to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

struct Selection<'a> {
    mode: ServiceKind,
    pet_id: &'a str,
    date: NaiveDate,
    staff_id: &'a str,
    time: NaiveTime,
}

fn selection(draft: &ReservationDraft) -> Result<Selection<'_>> {
    let missing = |field: &str| PawcareError::MissingFieldError {
        field: field.to_string(),
    };
    Ok(Selection {
        mode: draft.mode.ok_or_else(|| missing("mode"))?,
        pet_id: draft.pet_id.as_deref().ok_or_else(|| missing("pet"))?,
        date: draft.date.ok_or_else(|| missing("date"))?,
        staff_id: draft.staff_id.as_deref().ok_or_else(|| missing("staff"))?,
        time: draft.time.ok_or_else(|| missing("time"))?,
    })
}

fn payment_request(draft: &ReservationDraft, rules: &BookingRules) -> Result<PaymentRequest> {
    let selection = selection(draft)?;
    Ok(PaymentRequest {
        amount: rules.fee(selection.mode),
        currency: rules.currency.clone(),
        description: format!(
            "{} visit on {} at {}",
            selection.mode,
            selection.date,
            selection.time.format("%H:%M")
        ),
        service_type: selection.mode,
        staff_id: selection.staff_id.to_string(),
        pet_id: selection.pet_id.to_string(),
        date: selection.date,
        time: selection.time,
    })
}

fn new_service(draft: &ReservationDraft, payment_id: Option<String>) -> Result<NewService> {
    let selection = selection(draft)?;
    Ok(NewService {
        service_type: selection.mode,
        staff_id: selection.staff_id.to_string(),
        pet_id: selection.pet_id.to_string(),
        date: selection.date,
        time: selection.time,
        payment_id,
        note: None,
    })
}
