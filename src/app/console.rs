use crate::adapters::gateway::ApiGateway;
use crate::adapters::http::ApiClient;
use crate::app::services::{
    AdminService, AuthService, BookingService, PaymentService, PetService, ProfileService,
};
use crate::config::cli::LocalStorage;
use crate::config::commands::{
    AdminCommand, Command, PaymentCommand, PetArgs, PetCommand, ProfileCommand, ReserveCommand,
    ServiceCommand,
};
use crate::config::Settings;
use crate::core::calendar::{month_grid, render_month};
use crate::core::permissions::{self, Viewer};
use crate::core::reservation::{format_slots, ReservationDraft, ReservationFlow, Verification};
use crate::core::session::{AuthSession, SessionStore};
use crate::core::{ConfigProvider, Role, Service, ServiceStatus};
use crate::domain::forms::{LoginRequest, PetInput, ProfileUpdate, RegisterRequest, ReviewInput};
use crate::domain::model::{parse_date, parse_time, Pet};
use crate::utils::error::{PawcareError, Result};
use chrono::{Datelike, Local, NaiveDateTime};
use std::fmt::Write as _;

/// Runs one CLI command and returns what should be printed.
pub struct Console {
    settings: Settings,
    storage: LocalStorage,
    sessions: SessionStore<LocalStorage>,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl Console {
    pub fn new(settings: Settings) -> Self {
        let storage = LocalStorage::new(settings.state_dir());
        Self {
            sessions: SessionStore::new(storage.clone()),
            storage,
            settings,
            clock: local_now,
        }
    }

    /// Replaces the wall clock, mostly so the calendar can be pinned in tests.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    fn api(&self, session: Option<&AuthSession>) -> Result<ApiClient> {
        let client = ApiClient::new(&self.settings)?;
        Ok(match session {
            Some(session) => client.with_token(session.token.clone()),
            None => client,
        })
    }

    pub async fn run(&self, command: Command) -> Result<String> {
        match command {
            Command::Login {
                role,
                email,
                password,
            } => self.login(role, email, password).await,
            Command::Register {
                role,
                name,
                email,
                password,
                phone,
                address,
            } => {
                let request = RegisterRequest {
                    name: name.trim().to_string(),
                    email: email.trim().to_string(),
                    password,
                    phone: trimmed(phone),
                    address: trimmed(address),
                };
                self.register(role, request).await
            }
            Command::Logout => {
                self.sessions.clear().await?;
                Ok("👋 Signed out".to_string())
            }
            Command::Whoami => {
                let session = self.sessions.require().await?;
                Ok(format!("👤 User {} ({})", session.user_id, session.role))
            }
            Command::Profile(command) => self.profile(command).await,
            Command::Pets(command) => self.pets(command).await,
            Command::Services(command) => self.services(command).await,
            Command::Payments(command) => self.payments(command).await,
            Command::Reserve(command) => self.reserve(command).await,
            Command::Admin(command) => self.admin(command).await,
        }
    }

    async fn login(&self, role: Role, email: String, password: String) -> Result<String> {
        let api = self.api(None)?;
        let request = LoginRequest {
            email: email.trim().to_string(),
            password,
        };
        let session = AuthService::new(&api).login(role, &request).await?;
        self.sessions.save(&session).await?;
        Ok(format!(
            "✅ Signed in as {} ({}, user {})",
            request.email, session.role, session.user_id
        ))
    }

    async fn register(&self, role: Role, request: RegisterRequest) -> Result<String> {
        let api = self.api(None)?;
        let registration = AuthService::new(&api).register(role, &request).await?;
        match registration.session {
            Some(session) => {
                self.sessions.save(&session).await?;
                Ok(format!(
                    "✅ Registered and signed in as {} ({})",
                    request.email, role
                ))
            }
            None => Ok(format!(
                "✅ Registered {}{}, run `pawcare login` to sign in",
                request.email,
                registration
                    .user_id
                    .map(|id| format!(" (user {})", id))
                    .unwrap_or_default()
            )),
        }
    }

    async fn profile(&self, command: ProfileCommand) -> Result<String> {
        let session = self.sessions.require().await?;
        let api = self.api(Some(&session))?;
        let service = ProfileService::new(&api);

        let profile = match command {
            ProfileCommand::Show => service.fetch().await?,
            ProfileCommand::Update {
                name,
                email,
                phone,
                address,
            } => {
                service
                    .update(&ProfileUpdate {
                        name: trimmed(name),
                        email: trimmed(email),
                        phone: trimmed(phone),
                        address: trimmed(address),
                    })
                    .await?
            }
        };

        let mut out = String::new();
        let _ = writeln!(out, "👤 {} (user {})", profile.name, profile.id);
        let fields = [
            ("Email", profile.email),
            ("Phone", profile.phone),
            ("Address", profile.address),
            ("Role", profile.role.map(|r| r.to_string())),
        ];
        for (label, value) in fields {
            let _ = writeln!(out, "   {:<8} {}", label, value.as_deref().unwrap_or("-"));
        }
        Ok(out.trim_end().to_string())
    }

    async fn pets(&self, command: PetCommand) -> Result<String> {
        let session = self.sessions.require().await?;
        let api = self.api(Some(&session))?;
        let service = PetService::new(&api);

        match command {
            PetCommand::List => {
                let pets = service.list(&session.user_id).await?;
                Ok(render_pets(&pets))
            }
            PetCommand::Add(args) => {
                let pet = service.create(&session.user_id, &pet_input(args)).await?;
                Ok(format!("🐾 Added {} (pet {})", pet.name, pet.id))
            }
            PetCommand::Update { pet_id, pet } => {
                service.update(&pet_id, &pet_input(pet)).await?;
                Ok(format!("🐾 Updated pet {}", pet_id))
            }
            PetCommand::Remove { pet_id } => {
                service.delete(&pet_id).await?;
                Ok(format!("🗑️ Removed pet {}", pet_id))
            }
        }
    }

    async fn services(&self, command: ServiceCommand) -> Result<String> {
        let session = self.sessions.require().await?;
        let viewer = Viewer::from(&session);
        let api = self.api(Some(&session))?;
        let bookings = BookingService::new(&api);

        match command {
            ServiceCommand::List => {
                let services = bookings.list().await?;
                Ok(render_services(&services, Some(&viewer)))
            }
            ServiceCommand::Status { service_id, status } => {
                let service = lookup_service(&api, &session, &service_id).await?;
                ensure_status_allowed(&viewer, &service, status)?;
                bookings.change_status(&service_id, status).await?;
                Ok(format!("📅 Service {} is now {}", service_id, status))
            }
            ServiceCommand::Cancel { service_id } => {
                let service = lookup_service(&api, &session, &service_id).await?;
                if !permissions::can_cancel(&viewer, &service) {
                    return Err(PawcareError::PermissionDenied {
                        message: format!("service {} cannot be cancelled ({})", service_id, service.status),
                    });
                }
                bookings
                    .change_status(&service_id, ServiceStatus::Cancelled)
                    .await?;
                Ok(format!("📅 Service {} cancelled", service_id))
            }
            ServiceCommand::Review {
                service_id,
                rating,
                comment,
            } => {
                let service = lookup_service(&api, &session, &service_id).await?;
                if !permissions::can_review(&viewer, &service) {
                    return Err(PawcareError::PermissionDenied {
                        message: "only the owner can review, once the service is completed"
                            .to_string(),
                    });
                }
                bookings
                    .submit_review(&service_id, &ReviewInput { rating, comment })
                    .await?;
                Ok(format!("⭐ Thanks for reviewing service {}", service_id))
            }
            ServiceCommand::Reviews { service_id } => {
                let reviews = bookings.reviews(&service_id).await?;
                if reviews.is_empty() {
                    return Ok(format!("No reviews for service {} yet", service_id));
                }
                let mut out = String::new();
                for review in reviews {
                    let stars = review
                        .rating
                        .map(|r| "★".repeat(usize::from(r.min(5))))
                        .unwrap_or_default();
                    let _ = writeln!(
                        out,
                        "{:<5} {}",
                        stars,
                        review.comment.as_deref().unwrap_or("")
                    );
                }
                Ok(out.trim_end().to_string())
            }
        }
    }

    async fn payments(&self, command: PaymentCommand) -> Result<String> {
        let session = self.sessions.require().await?;
        let api = self.api(Some(&session))?;

        match command {
            PaymentCommand::List => {
                let payments = PaymentService::new(&api).list().await?;
                if payments.is_empty() {
                    return Ok("No payments yet".to_string());
                }
                let mut out = String::new();
                for payment in payments {
                    let _ = writeln!(
                        out,
                        "💳 {:<12} {:>10} {:<4} {:<9} service {}",
                        payment.id,
                        payment
                            .amount
                            .map(|a| format!("{:.0}", a))
                            .unwrap_or_else(|| "-".to_string()),
                        payment.currency.as_deref().unwrap_or(""),
                        payment.status,
                        payment.service_id.as_deref().unwrap_or("-")
                    );
                }
                Ok(out.trim_end().to_string())
            }
        }
    }

    async fn reserve(&self, command: ReserveCommand) -> Result<String> {
        let session = self.sessions.require_role(&[Role::Owner]).await?;
        let api = self.api(Some(&session))?;
        let flow = ReservationFlow::new(
            self.storage.clone(),
            ApiGateway::new(api.clone()),
            self.settings.booking.clone(),
        );
        let now = self.now();

        match command {
            ReserveCommand::Show => Ok(render_draft(&flow.draft().await?)),
            ReserveCommand::Mode { kind } => Ok(render_draft(&flow.select_mode(kind).await?)),
            ReserveCommand::Pet { pet_id } => {
                let pets = PetService::new(&api).list(&session.user_id).await?;
                if !pets.iter().any(|pet| pet.id == pet_id) {
                    return Err(PawcareError::InvalidValueError {
                        field: "pet_id".to_string(),
                        value: pet_id,
                        reason: "Not one of your pets, see `pawcare pets list`".to_string(),
                    });
                }
                Ok(render_draft(&flow.select_pet(&pet_id).await?))
            }
            ReserveCommand::Calendar { year, month } => {
                let today = now.date();
                let year = year.unwrap_or_else(|| today.year());
                let month = month.unwrap_or_else(|| today.month());
                let weeks = month_grid(year, month, today, flow.rules())?;
                let draft = flow.draft().await?;
                Ok(format!(
                    "📆 {}-{:02}  (days in brackets cannot be booked)\n{}",
                    year,
                    month,
                    render_month(&weeks, draft.date).trim_end()
                ))
            }
            ReserveCommand::Date { date } => {
                let date = parse_date(&date).ok_or_else(|| PawcareError::InvalidValueError {
                    field: "date".to_string(),
                    value: date.clone(),
                    reason: "Use YYYY-MM-DD".to_string(),
                })?;
                Ok(render_draft(&flow.select_date(date, now).await?))
            }
            ReserveCommand::Staff => {
                let draft = flow.draft().await?;
                let kind = draft.mode.ok_or_else(|| PawcareError::FlowError {
                    message: "choose doctor or caretaker first".to_string(),
                })?;
                let staff = BookingService::new(&api).staff(kind).await?;
                if staff.is_empty() {
                    return Ok(format!("No {} is available", kind));
                }
                let mut out = String::new();
                for member in &staff {
                    let slots = flow.available_slots(Some(member), now).await?;
                    let _ = writeln!(
                        out,
                        "🧑‍⚕️ {:<8} {:<20} {}",
                        member.id,
                        member.display_name(),
                        format_slots(&slots)
                    );
                }
                Ok(out.trim_end().to_string())
            }
            ReserveCommand::Pick { staff_id, time } => {
                let draft = flow.draft().await?;
                let kind = draft.mode.ok_or_else(|| PawcareError::FlowError {
                    message: "choose doctor or caretaker first".to_string(),
                })?;
                let time = parse_time(&time).ok_or_else(|| PawcareError::InvalidValueError {
                    field: "time".to_string(),
                    value: time.clone(),
                    reason: "Use HH:MM".to_string(),
                })?;
                let staff = BookingService::new(&api).staff(kind).await?;
                let member = staff
                    .iter()
                    .find(|member| member.id == staff_id)
                    .ok_or_else(|| PawcareError::InvalidValueError {
                        field: "staff_id".to_string(),
                        value: staff_id.clone(),
                        reason: format!("No {} with that id, see `pawcare reserve staff`", kind),
                    })?;
                Ok(render_draft(&flow.select_staff_time(member, time, now).await?))
            }
            ReserveCommand::Pay => {
                let draft = flow.begin_payment(now).await?;
                Ok(format!(
                    "💳 Complete the payment at: {}\n   then run `pawcare reserve verify`",
                    draft.checkout_url.as_deref().unwrap_or("(no checkout link returned)")
                ))
            }
            ReserveCommand::Verify => match flow.verify().await? {
                Verification::Confirmed { service_id } => {
                    Ok(format!("✅ Reservation confirmed (service {})", service_id))
                }
                Verification::StillPending { checkout_url } => Ok(format!(
                    "⏳ Payment not completed yet{}",
                    checkout_url
                        .map(|url| format!(", finish it at {}", url))
                        .unwrap_or_default()
                )),
            },
            ReserveCommand::Reset => {
                flow.reset().await?;
                Ok("🧹 Reservation draft cleared".to_string())
            }
        }
    }

    async fn admin(&self, command: AdminCommand) -> Result<String> {
        let session = self.sessions.require().await?;
        if !permissions::can_access_admin(session.role) {
            return Err(PawcareError::PermissionDenied {
                message: "the back office is for admin accounts".to_string(),
            });
        }
        let api = self.api(Some(&session))?;
        let admin = AdminService::new(&api);

        match command {
            AdminCommand::Users => {
                let users = admin.users().await?;
                let mut out = String::new();
                for user in users {
                    let _ = writeln!(
                        out,
                        "{:<8} {:<20} {:<28} {:<10} {}",
                        user.id,
                        user.name,
                        user.email.as_deref().unwrap_or("-"),
                        user.role.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
                        if user.active { "active" } else { "inactive" }
                    );
                }
                Ok(or_empty(out, "No users"))
            }
            AdminCommand::DeleteUser { user_id } => {
                if user_id == session.user_id {
                    return Err(PawcareError::ValidationError {
                        message: "you cannot delete your own account here".to_string(),
                    });
                }
                admin.delete_user(&user_id).await?;
                Ok(format!("🗑️ Deleted user {}", user_id))
            }
            AdminCommand::SetRole { user_id, role } => {
                admin.set_role(&user_id, role).await?;
                Ok(format!("👤 User {} is now {}", user_id, role))
            }
            AdminCommand::Activate { user_id } => {
                admin.set_active(&user_id, true).await?;
                Ok(format!("👤 User {} activated", user_id))
            }
            AdminCommand::Deactivate { user_id } => {
                admin.set_active(&user_id, false).await?;
                Ok(format!("👤 User {} deactivated", user_id))
            }
            AdminCommand::Services => {
                let services = admin.services().await?;
                Ok(render_services(&services, None))
            }
            AdminCommand::Pets => Ok(render_pets(&admin.pets().await?)),
            AdminCommand::DeletePet { pet_id } => {
                admin.delete_pet(&pet_id).await?;
                Ok(format!("🗑️ Deleted pet {}", pet_id))
            }
        }
    }
}

/// Blank optional fields are treated as not given.
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn pet_input(args: PetArgs) -> PetInput {
    PetInput {
        name: args.name,
        species: args.species,
        breed: args.breed,
        age: args.age,
        weight: args.weight,
        notes: args.notes,
    }
}

/// `GET /services` only lists the caller's own services, so admins resolve
/// the target from the back-office list.
async fn lookup_service(api: &ApiClient, session: &AuthSession, service_id: &str) -> Result<Service> {
    let services = if permissions::can_access_admin(session.role) {
        AdminService::new(api).services().await?
    } else {
        BookingService::new(api).list().await?
    };
    find_service(&services, service_id)
}

fn find_service(services: &[Service], service_id: &str) -> Result<Service> {
    services
        .iter()
        .find(|s| s.id == service_id)
        .cloned()
        .ok_or_else(|| PawcareError::ApiStatusError {
            status: 404,
            message: format!("Service {} not found", service_id),
        })
}

fn ensure_status_allowed(viewer: &Viewer<'_>, service: &Service, status: ServiceStatus) -> Result<()> {
    let options = permissions::status_options(viewer, service);
    if options.contains(&status) {
        return Ok(());
    }
    let message = if service.status.is_terminal() {
        format!("service {} is already {}", service.id, service.status)
    } else if options.is_empty() {
        format!("you cannot change the status of service {}", service.id)
    } else {
        format!(
            "service {} can only move to: {}",
            service.id,
            options
                .iter()
                .map(ServiceStatus::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )
    };
    Err(PawcareError::PermissionDenied { message })
}

fn or_empty(out: String, empty: &str) -> String {
    if out.is_empty() {
        empty.to_string()
    } else {
        out.trim_end().to_string()
    }
}

fn render_pets(pets: &[Pet]) -> String {
    let mut out = String::new();
    for pet in pets {
        let _ = writeln!(
            out,
            "🐾 {:<8} {:<16} {:<10} {:<14} {}",
            pet.id,
            pet.name,
            pet.species.as_deref().unwrap_or("-"),
            pet.breed.as_deref().unwrap_or("-"),
            pet.age.map(|a| format!("{}y", a)).unwrap_or_default()
        );
    }
    or_empty(out, "No pets yet")
}

/// With a viewer, each row also lists the status changes that viewer may make.
pub fn render_services(services: &[Service], viewer: Option<&Viewer<'_>>) -> String {
    let mut out = String::new();
    for service in services {
        let when = match (service.date, service.time) {
            (Some(date), Some(time)) => format!("{} {}", date, time.format("%H:%M")),
            (Some(date), None) => date.to_string(),
            _ => "-".to_string(),
        };
        let _ = write!(
            out,
            "📅 {:<8} {:<10} {:<10} {:<17} staff {}",
            service.id,
            service.kind.map(|k| k.to_string()).unwrap_or_else(|| "-".to_string()),
            service.status,
            when,
            service
                .staff_name
                .as_deref()
                .or(service.staff_id.as_deref())
                .unwrap_or("-")
        );
        if let Some(viewer) = viewer {
            let options = permissions::status_options(viewer, service);
            if !options.is_empty() {
                let _ = write!(
                    out,
                    "  [→ {}]",
                    options
                        .iter()
                        .map(ServiceStatus::as_str)
                        .collect::<Vec<_>>()
                        .join("/")
                );
            }
            if permissions::can_review(viewer, service) {
                let _ = write!(out, "  [review]");
            }
        }
        out.push('\n');
    }
    or_empty(out, "No reservations yet")
}

fn render_draft(draft: &ReservationDraft) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📝 Reservation draft (next: {})", draft.step());
    let rows = [
        ("Type", draft.mode.map(|m| m.to_string())),
        ("Pet", draft.pet_id.clone()),
        ("Date", draft.date.map(|d| d.to_string())),
        (
            "Staff",
            draft
                .staff_name
                .clone()
                .or_else(|| draft.staff_id.clone()),
        ),
        ("Time", draft.time.map(|t| t.format("%H:%M").to_string())),
        (
            "Amount",
            draft.amount.map(|a| {
                format!("{:.0} {}", a, draft.currency.as_deref().unwrap_or(""))
                    .trim_end()
                    .to_string()
            }),
        ),
        ("Payment", draft.payment_id.clone()),
        ("Service", draft.service_id.clone()),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "   {:<8} {}", label, value.as_deref().unwrap_or("-"));
    }
    out.trim_end().to_string()
}
