use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Role carried in the session token. Anything that is not `admin` is treated as a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(other)]
    Member,
}

impl Role {
    pub fn from_wire(role: &str) -> Self {
        if role.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Member
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Owning user of a loan or contribution payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserRef {
    pub id: String,
    pub name: Option<String>,
}

/// User record as the backend sends it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawUser {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl From<RawUser> for UserRef {
    fn from(user: RawUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
        }
    }
}

/// A user reference on the wire is either populated or a bare id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawUserRef {
    Populated(RawUser),
    Id(String),
}

impl From<RawUserRef> for UserRef {
    fn from(user: RawUserRef) -> Self {
        match user {
            RawUserRef::Populated(user) => user.into(),
            RawUserRef::Id(id) => UserRef { id, name: None },
        }
    }
}

/// Response of the paginated user listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<RawUser>,
    #[serde(default)]
    pub total: u64,
}

/// Credentials posted to the login endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response carrying the bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
