//! Which controls a signed-in user gets to see.
//!
//! Nothing here is a security boundary: the API enforces access. These checks
//! decide what the client offers, and they keep the client from sending
//! requests that are bound to be refused.

use crate::core::session::AuthSession;
use crate::core::{Role, Service, ServiceStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer<'a> {
    pub role: Role,
    pub user_id: &'a str,
}

impl<'a> From<&'a AuthSession> for Viewer<'a> {
    fn from(session: &'a AuthSession) -> Self {
        Self {
            role: session.role,
            user_id: &session.user_id,
        }
    }
}

fn is_assigned_staff(viewer: &Viewer<'_>, service: &Service) -> bool {
    if !viewer.role.is_staff() {
        return false;
    }
    let kind_matches = match service.kind {
        Some(kind) => kind.staff_role() == viewer.role,
        None => true,
    };
    kind_matches && service.staff_id.as_deref() == Some(viewer.user_id)
}

fn is_owner(viewer: &Viewer<'_>, service: &Service) -> bool {
    viewer.role == Role::Owner && service.owner_id.as_deref() == Some(viewer.user_id)
}

/// The status-change control: the assigned staff member or an admin, never the owner.
pub fn can_change_status(viewer: &Viewer<'_>, service: &Service) -> bool {
    match viewer.role {
        Role::Admin => true,
        Role::Doctor | Role::Caretaker => is_assigned_staff(viewer, service),
        Role::Owner => false,
    }
}

/// Statuses this viewer may move the service to, in display order.
pub fn status_options(viewer: &Viewer<'_>, service: &Service) -> Vec<ServiceStatus> {
    let current = service.status;
    let wanted: &[ServiceStatus] = match viewer.role {
        Role::Admin => &ServiceStatus::ALL,
        Role::Doctor | Role::Caretaker if is_assigned_staff(viewer, service) => &[
            ServiceStatus::Accepted,
            ServiceStatus::Rejected,
            ServiceStatus::Completed,
        ],
        Role::Owner if is_owner(viewer, service) => &[ServiceStatus::Cancelled],
        _ => &[],
    };

    wanted
        .iter()
        .copied()
        .filter(|next| current.can_transition_to(*next))
        .collect()
}

pub fn can_cancel(viewer: &Viewer<'_>, service: &Service) -> bool {
    status_options(viewer, service).contains(&ServiceStatus::Cancelled)
}

/// Owners review their own services once they are completed.
pub fn can_review(viewer: &Viewer<'_>, service: &Service) -> bool {
    is_owner(viewer, service) && service.status == ServiceStatus::Completed
}

pub fn can_access_admin(role: Role) -> bool {
    role == Role::Admin
}
