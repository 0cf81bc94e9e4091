use std::fmt;

use serde::{Deserialize, Serialize};

/// Role granted to a user by the server.
///
/// Unknown role strings are kept verbatim so a newer server can introduce
/// roles without breaking older clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Admin,
    Manager,
    Support,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Support => "support",
            Role::Other(s) => s.as_str(),
        }
    }

    /// Whether a holder of this role may enter a view that requires `required`.
    /// Admins satisfy every requirement.
    pub fn satisfies(&self, required: &Role) -> bool {
        *self == Role::Admin || self == required
    }

    pub fn display_name(&self) -> &str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Support => "Support",
            Role::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "user" => Role::User,
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            "support" => Role::Support,
            _ => Role::Other(s),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::from(s.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated user identity.
///
/// Always derived from the session token, either by decoding its payload or
/// by asking `/user/` about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Effective role; a user without one is a plain user.
    pub fn role(&self) -> Role {
        self.role.clone().unwrap_or(Role::User)
    }

    pub fn has_role(&self, required: &Role) -> bool {
        self.role().satisfies(required)
    }

    /// Name to greet the user with: full name, then username, then email.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                return format!("{} {}", first, last);
            }
            (Some(first), _) if !first.is_empty() => return first.clone(),
            _ => {}
        }
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| format!("user #{}", self.id))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub password: &'a str,
}

/// Login payload. Anything besides the token is ignored; the identity is
/// always derived from the token.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
