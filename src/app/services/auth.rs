use crate::adapters::http::ApiClient;
use crate::core::session::AuthSession;
use crate::domain::forms::{LoginRequest, RegisterRequest};
use crate::domain::model::Role;
use crate::utils::error::{PawcareError, Result};
use crate::utils::fields::{probe_string, require_string, unwrap_envelope};
use crate::utils::validation::Validate;
use serde_json::Value;

const TOKEN_FIELDS: &[&str] = &[
    "token",
    "access_token",
    "accessToken",
    "jwt",
    "data.token",
    "data.access_token",
    "data.accessToken",
];
const LOGIN_USER_ID_FIELDS: &[&str] = &[
    "user_id",
    "userId",
    "id",
    "user.user_id",
    "user.userId",
    "user.id",
    "data.user_id",
    "data.userId",
    "data.user.user_id",
    "data.user.userId",
    "data.user.id",
];
const LOGIN_ROLE_FIELDS: &[&str] = &["role", "user.role", "data.role", "data.user.role"];

/// Outcome of a registration: some deployments log the new user straight in.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user_id: Option<String>,
    pub session: Option<AuthSession>,
}

pub struct AuthService<'a> {
    api: &'a ApiClient,
}

impl<'a> AuthService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn login(&self, role: Role, request: &LoginRequest) -> Result<AuthSession> {
        request.validate()?;
        tracing::info!("🔐 Signing in as {} ({})", request.email, role);

        let body = self
            .api
            .post(&format!("/auth/login/{}", role.as_str()), request)
            .await?;

        session_from_response(&body, role)
    }

    pub async fn register(&self, role: Role, request: &RegisterRequest) -> Result<Registration> {
        request.validate()?;
        tracing::info!("📝 Registering {} as {}", request.email, role);

        let body = self
            .api
            .post(&format!("/auth/register/{}", role.as_str()), request)
            .await?;

        let session = if probe_string(&body, TOKEN_FIELDS).is_some() {
            Some(session_from_response(&body, role)?)
        } else {
            None
        };
        let user_id = session
            .as_ref()
            .map(|s| s.user_id.clone())
            .or_else(|| probe_string(&unwrap_envelope(body, &["user"]), &["user_id", "userId", "id"]));

        Ok(Registration { user_id, session })
    }
}

/// The API has shipped at least three login response shapes, so both the
/// token and the user id are probed at the top level and inside envelopes.
fn session_from_response(body: &Value, requested: Role) -> Result<AuthSession> {
    let token = require_string(body, TOKEN_FIELDS, "Login response")?;
    let user_id = require_string(body, LOGIN_USER_ID_FIELDS, "Login response")?;

    let role = match probe_string(body, LOGIN_ROLE_FIELDS) {
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => role,
            Err(_) => {
                tracing::warn!("⚠️ Unknown role '{}' in login response, using {}", raw, requested);
                requested
            }
        },
        None => requested,
    };

    if role != requested {
        // API 回傳的角色和登入入口不符
        return Err(PawcareError::PermissionDenied {
            message: format!("this account is a {} account, not {}", role, requested),
        });
    }

    Ok(AuthSession {
        token,
        role,
        user_id,
    })
}
