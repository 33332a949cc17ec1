use crate::domain::model::{Role, ServiceKind, ServiceStatus};
use clap::{Args, Subcommand};

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse().map_err(|e: crate::PawcareError| e.user_friendly_message())
}

fn parse_kind(raw: &str) -> Result<ServiceKind, String> {
    raw.parse().map_err(|e: crate::PawcareError| e.user_friendly_message())
}

fn parse_status(raw: &str) -> Result<ServiceStatus, String> {
    raw.parse().map_err(|e: crate::PawcareError| e.user_friendly_message())
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long, value_parser = parse_role, default_value = "owner")]
        role: Role,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PAWCARE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long, value_parser = parse_role, default_value = "owner")]
        role: Role,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PAWCARE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// View or edit your profile
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Manage your pets
    #[command(subcommand)]
    Pets(PetCommand),
    /// Your reservations
    #[command(subcommand)]
    Services(ServiceCommand),
    /// Your payments
    #[command(subcommand)]
    Payments(PaymentCommand),
    /// Step through a new reservation
    #[command(subcommand)]
    Reserve(ReserveCommand),
    /// Back-office management (admin accounts only)
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProfileCommand {
    Show,
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct PetArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub species: String,
    #[arg(long)]
    pub breed: Option<String>,
    #[arg(long)]
    pub age: Option<u32>,
    #[arg(long)]
    pub weight: Option<f64>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum PetCommand {
    List,
    Add(PetArgs),
    Update {
        pet_id: String,
        #[command(flatten)]
        pet: PetArgs,
    },
    Remove {
        pet_id: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ServiceCommand {
    /// List reservations with the status options you have for each
    List,
    /// Move a reservation to a new status
    Status {
        service_id: String,
        #[arg(value_parser = parse_status)]
        status: ServiceStatus,
    },
    /// Cancel one of your reservations
    Cancel { service_id: String },
    /// Review a completed reservation
    Review {
        service_id: String,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Show reviews for a reservation
    Reviews { service_id: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum PaymentCommand {
    List,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ReserveCommand {
    /// Show the draft and the next step
    Show,
    /// Choose doctor or caretaker
    Mode {
        #[arg(value_parser = parse_kind)]
        kind: ServiceKind,
    },
    /// Choose which pet the reservation is for
    Pet { pet_id: String },
    /// Print a month calendar (defaults to the current month)
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Choose the date (YYYY-MM-DD)
    Date { date: String },
    /// List staff and their open slots on the chosen date
    Staff,
    /// Choose a staff member and time (HH:MM)
    Pick { staff_id: String, time: String },
    /// Open the checkout for the draft
    Pay,
    /// Check the payment and confirm the reservation
    Verify,
    /// Throw the draft away
    Reset,
}

#[derive(Debug, Clone, Subcommand)]
pub enum AdminCommand {
    Users,
    DeleteUser {
        user_id: String,
    },
    SetRole {
        user_id: String,
        #[arg(value_parser = parse_role)]
        role: Role,
    },
    Activate {
        user_id: String,
    },
    Deactivate {
        user_id: String,
    },
    Services,
    Pets,
    DeletePet {
        pet_id: String,
    },
}
