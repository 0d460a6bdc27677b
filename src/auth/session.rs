use crate::auth::repo_types::Role;

/// The caller of a service operation.
///
/// Built by the transport layer (from a verified access token) and passed by
/// reference into every query operation. Services never hold one between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}
