#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

/// Logged-in identity, owned by whoever drives the commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<i64>,
    pub username: String,
    pub role: Role,
}

impl Session {
    pub fn user(user_id: i64, username: String) -> Self {
        Self {
            user_id: Some(user_id),
            username,
            role: Role::User,
        }
    }

    pub fn admin(username: String) -> Self {
        Self {
            user_id: None,
            username,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
