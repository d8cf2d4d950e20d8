use crate::{schema::UserRole, session::SessionData};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageAllRecipes,
            ActionType::ManageUsers,
        ],
    ),
];

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnCart,
    ManageOwnSubscriptions,

    ManageUsers,
    ManageAllRecipes,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        let role = &session.role;

        ACTION_TABLE
            .iter()
            .find_map(|(uid, actions)| {
                if role != uid {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: UserRole) -> SessionData {
        SessionData {
            user_id: 1,
            username: String::from("olga"),
            is_admin: role == UserRole::Admin,
            role,
        }
    }

    #[test]
    fn regular_users_manage_only_their_own_data() {
        let session = session(UserRole::User);
        assert!(ActionType::CreateRecipes.authenticate(&session));
        assert!(ActionType::ManageOwnFavorites.authenticate(&session));
        assert!(!ActionType::ManageAllRecipes.authenticate(&session));
        assert!(!ActionType::ManageUsers.authenticate(&session));
    }

    #[test]
    fn admins_manage_everything() {
        let session = session(UserRole::Admin);
        assert!(ActionType::ManageAllRecipes.authenticate(&session));
        assert!(ActionType::ManageUsers.authenticate(&session));
    }
}
