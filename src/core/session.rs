use crate::core::{Role, Storage};
use crate::utils::error::{PawcareError, Result};
use serde::{Deserialize, Serialize};

const SESSION_FILE: &str = "session.json";

/// The signed-in identity. The token is opaque and only ever echoed back to the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub role: Role,
    pub user_id: String,
}

/// Persists the auth token between invocations.
pub struct SessionStore<S: Storage> {
    storage: S,
}

impl<S: Storage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn load(&self) -> Result<Option<AuthSession>> {
        match self.storage.read_file(SESSION_FILE).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    // 壞掉的 session 檔當作未登入
                    tracing::warn!("⚠️ Ignoring unreadable session file: {}", e);
                    Ok(None)
                }
            },
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn save(&self, session: &AuthSession) -> Result<()> {
        let data = serde_json::to_vec_pretty(session)?;
        self.storage.write_file(SESSION_FILE, &data).await?;
        tracing::debug!("Saved session for user {}", session.user_id);
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match self.storage.remove_file(SESSION_FILE).await {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }

    pub async fn require(&self) -> Result<AuthSession> {
        self.load().await?.ok_or(PawcareError::NotAuthenticated)
    }

    pub async fn require_role(&self, allowed: &[Role]) -> Result<AuthSession> {
        let session = self.require().await?;
        if allowed.contains(&session.role) {
            Ok(session)
        } else {
            Err(PawcareError::PermissionDenied {
                message: format!(
                    "{} accounts cannot do this (needs {})",
                    session.role,
                    allowed
                        .iter()
                        .map(Role::as_str)
                        .collect::<Vec<_>>()
                        .join(" or ")
                ),
            })
        }
    }
}
