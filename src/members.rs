use crate::model::{Role, UserSummary};

/// Keep only regular members, the people staff can book on behalf of.
pub fn members_only(users: Vec<UserSummary>) -> Vec<UserSummary> {
    users
        .into_iter()
        .filter(|u| u.role == Some(Role::Socio))
        .collect()
}

/// Case-insensitive substring match on username or email. An empty query
/// matches everyone.
pub fn search<'a>(members: &'a [UserSummary], query: &str) -> Vec<&'a UserSummary> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return members.iter().collect();
    }

    members
        .iter()
        .filter(|m| {
            m.username.to_lowercase().contains(&needle)
                || m
                    .email
                    .as_ref()
                    .is_some_and(|e| e.to_lowercase().contains(&needle))
        })
        .collect()
}
