use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::permissions::ActionType;
use crate::schema::{User, UserRole};

/// Identity of the requesting user, resolved by the consuming
/// application's auth layer before any action in this crate runs.
/// Actions take it as proof that authentication already happened and
/// only decide authorization.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), Error> {
        if !action.authenticate(self) {
            return Err(Error::Permission(
                "you don't have permission to perform this action",
            ));
        }
        Ok(())
    }
}

impl From<&User> for SessionData {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.to_owned(),
            is_admin: user.role == UserRole::Admin,
            role: user.role.to_owned(),
        }
    }
}
