use base64::{engine::general_purpose, Engine as _};
use projections::Actor;
use serde::{Deserialize, Serialize};
use shared_types::Role;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ApiError;

/// Identity decoded from the session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
}

/// Authentication state passed explicitly into every API call.
///
/// The token is opaque to the console apart from its payload, which carries the user id and
/// role. Signatures are checked by the backend only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<SessionUser>,
}

#[derive(Deserialize)]
struct TokenClaims {
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    role: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session without a token, used to browse snapshot data as a given role
    pub fn offline(role: Role, user_id: Option<String>) -> Self {
        Self {
            token: None,
            user: user_id
                .or_else(|| role.is_admin().then(|| "admin".to_string()))
                .map(|id| SessionUser {
                    id,
                    role,
                    name: None,
                }),
        }
    }

    pub fn from_token(token: &str) -> Result<Self, ApiError> {
        let user = decode_token_user(token)?;
        Ok(Self {
            token: Some(token.to_string()),
            user: Some(user),
        })
    }

    /// Replaces the current session with the one carried by `token`
    pub fn login(&mut self, token: &str) -> Result<(), ApiError> {
        *self = Self::from_token(token)?;
        if let Some(user) = &self.user {
            info!("Logged in as {} ({:?})", user.id, user.role);
        }
        Ok(())
    }

    pub fn logout(&mut self) {
        *self = Self::anonymous();
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Token for an authenticated request, or `NotAuthenticated` before any network access
    pub fn require_token(&self) -> Result<&str, ApiError> {
        self.token().ok_or(ApiError::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn role(&self) -> Role {
        self.user.as_ref().map(|u| u.role).unwrap_or(Role::Member)
    }

    pub fn set_display_name(&mut self, name: Option<String>) {
        if let Some(user) = self.user.as_mut() {
            user.name = name;
        }
    }

    pub fn actor(&self) -> Actor {
        Actor {
            role: self.role(),
            user_id: self.user_id().map(str::to_string),
        }
    }

    /// Reads a persisted session. A missing file is an anonymous session.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        if !path.exists() {
            debug!("No session file at {:?}", path);
            return Ok(Self::anonymous());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ApiError::SessionFile(format!("Failed to read session file: {}", e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| ApiError::SessionFile(format!("Corrupt session file: {}", e)))
    }

    pub fn save(&self, path: &Path) -> Result<(), ApiError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::SessionFile(format!("Failed to create session directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ApiError::SessionFile(e.to_string()))?;
        std::fs::write(path, contents)
            .map_err(|e| ApiError::SessionFile(format!("Failed to write session file: {}", e)))
    }

    pub fn clear(path: &Path) -> Result<(), ApiError> {
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| {
                ApiError::SessionFile(format!("Failed to remove session file: {}", e))
            })?;
        }
        Ok(())
    }
}

fn decode_token_user(token: &str) -> Result<SessionUser, ApiError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| ApiError::InvalidToken("token has no payload segment".to_string()))?;

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ApiError::InvalidToken(format!("payload is not base64url: {}", e)))?;

    let claims: TokenClaims = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::InvalidToken(format!("unexpected payload: {}", e)))?;

    Ok(SessionUser {
        id: claims.user.id,
        role: claims
            .user
            .role
            .as_deref()
            .map(Role::from_wire)
            .unwrap_or(Role::Member),
        name: None,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn token_for(id: &str, role: &str) -> String {
        let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(
            serde_json::json!({ "user": { "id": id, "role": role }, "iat": 1700000000 })
                .to_string(),
        );
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn test_role_is_decoded_from_token() {
        let session = Session::from_token(&token_for("u-1", "admin")).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.role(), Role::Admin);
        assert_eq!(session.user_id(), Some("u-1"));

        let member = Session::from_token(&token_for("u-2", "staff")).unwrap();
        assert_eq!(member.role(), Role::Member);
        assert_eq!(member.actor().user_id.as_deref(), Some("u-2"));
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        assert!(matches!(
            Session::from_token("not-a-jwt"),
            Err(ApiError::InvalidToken(_))
        ));
        assert!(matches!(
            Session::from_token("a.!!!.c"),
            Err(ApiError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_logout_clears_everything() {
        let mut session = Session::anonymous();
        session.login(&token_for("u-1", "admin")).unwrap();
        session.logout();

        assert!(!session.is_authenticated());
        assert_eq!(session.role(), Role::Member);
        assert!(matches!(
            session.require_token(),
            Err(ApiError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("session.json");

        assert_eq!(Session::load(&path).unwrap(), Session::anonymous());

        let session = Session::from_token(&token_for("u-9", "admin")).unwrap();
        session.save(&path).unwrap();
        assert_eq!(Session::load(&path).unwrap(), session);

        Session::clear(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_offline_session() {
        let admin = Session::offline(Role::Admin, None);
        assert_eq!(admin.role(), Role::Admin);
        assert!(!admin.is_authenticated());

        let member = Session::offline(Role::Member, Some("u-3".to_string()));
        assert_eq!(member.user_id(), Some("u-3"));
        assert_eq!(Session::offline(Role::Member, None).user(), None);
    }
}
