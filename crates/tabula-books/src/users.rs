//! Registered users.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tabula_core::Actor;

/// Permission to see other users' private fields.
pub const VIEW_PRIVATE_PERMISSION: &str = "users.view_private";

/// How long after the last request a user still counts as online, in seconds.
pub const ONLINE_WINDOW_SECS: i64 = 300;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Identifier.
    pub id: i64,
    /// Phone number, private.
    pub phone_number: Option<String>,
    /// Public handle.
    pub username: Option<String>,
    /// First name.
    pub first_name: String,
    /// Last name, private.
    pub last_name: Option<String>,
    /// Middle name, private.
    pub middle_name: Option<String>,
    /// Time of the last authenticated request.
    pub last_request_date: Option<DateTime<Utc>>,
    /// Granted permissions.
    pub permissions: Vec<String>,
}

impl UserRecord {
    /// Creates a user with only the required fields.
    #[must_use]
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            phone_number: None,
            username: None,
            first_name: first_name.into(),
            last_name: None,
            middle_name: None,
            last_request_date: None,
            permissions: Vec::new(),
        }
    }

    /// Whether the last request falls within [`ONLINE_WINDOW_SECS`] of `now`.
    #[must_use]
    pub fn is_online(&self, now: DateTime<Utc>) -> bool {
        self.last_request_date
            .is_some_and(|last| last > now - Duration::seconds(ONLINE_WINDOW_SECS))
    }

    /// The actor a session of this user carries.
    #[must_use]
    pub fn actor(&self) -> Actor {
        self.permissions
            .iter()
            .fold(Actor::new(self.id), |actor, p| actor.with_permission(p.as_str()))
    }
}

/// Thread-safe user registry.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<BTreeMap<i64, UserRecord>>,
}

impl UserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory with an administrator (id 1) and a reader (id 2).
    #[must_use]
    pub fn seeded() -> Self {
        let directory = Self::new();
        directory.insert(UserRecord {
            phone_number: Some("+77010000001".to_string()),
            username: Some("admin".to_string()),
            last_name: Some("Librarian".to_string()),
            permissions: vec![VIEW_PRIVATE_PERMISSION.to_string()],
            ..UserRecord::new(1, "Head")
        });
        directory.insert(UserRecord {
            phone_number: Some("+77010000002".to_string()),
            username: Some("reader".to_string()),
            last_name: Some("Reader".to_string()),
            middle_name: Some("Avid".to_string()),
            ..UserRecord::new(2, "Ada")
        });
        directory
    }

    /// Adds or replaces a user.
    pub fn insert(&self, user: UserRecord) {
        self.users.write().insert(user.id, user);
    }

    /// Looks a user up.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<UserRecord> {
        self.users.read().get(&id).cloned()
    }

    /// Records a request by user `id` at `now`.
    pub fn touch(&self, id: i64, now: DateTime<Utc>) {
        if let Some(user) = self.users.write().get_mut(&id) {
            user.last_request_date = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_window() {
        let now = Utc::now();
        let mut user = UserRecord::new(1, "Ada");
        assert!(!user.is_online(now));

        user.last_request_date = Some(now - Duration::seconds(ONLINE_WINDOW_SECS - 1));
        assert!(user.is_online(now));

        user.last_request_date = Some(now - Duration::seconds(ONLINE_WINDOW_SECS));
        assert!(!user.is_online(now));
    }

    #[test]
    fn test_actor_carries_permissions() {
        let directory = UserDirectory::seeded();
        let admin = directory.get(1).unwrap().actor();
        assert!(admin.has_permission(VIEW_PRIVATE_PERMISSION));
        let reader = directory.get(2).unwrap().actor();
        assert_eq!(reader.id(), 2);
        assert!(!reader.has_permission(VIEW_PRIVATE_PERMISSION));
    }

    #[test]
    fn test_touch() {
        let directory = UserDirectory::seeded();
        let now = Utc::now();
        directory.touch(2, now);
        directory.touch(99, now);
        assert_eq!(directory.get(2).unwrap().last_request_date, Some(now));
        assert!(directory.get(99).is_none());
    }
}
