//! Member roster panel, rebuilt from a full read of the `users` collection.

use std::collections::BTreeMap;

use adapters::{UserId, UserRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberTag {
    pub user_id: UserId,
    pub name: String,
    pub is_current_user: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterPanel {
    members: Vec<MemberTag>,
}

impl RosterPanel {
    /// Replaces the panel with one tag per user, in id order.
    pub fn render(&mut self, users: &BTreeMap<UserId, UserRecord>, local_user: Option<&UserId>) {
        self.members = users
            .iter()
            .map(|(id, record)| MemberTag {
                user_id: id.clone(),
                name: record.name.clone(),
                is_current_user: Some(id) == local_user,
            })
            .collect();
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> &[MemberTag] {
        &self.members
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}
