use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::model::User;

#[derive(Debug, Default)]
struct UserTable {
    next_id: i64,
    rows: BTreeMap<i64, User>,
    by_username: HashMap<String, i64>,
}

/// Users keyed by id with a unique username index.
#[derive(Debug, Default)]
pub struct UserStore {
    table: RwLock<UserTable>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user. Fails with [`CoreError::Conflict`] if the username is
    /// taken; the check and insert happen under one write lock.
    pub fn create(&self, username: &str, password_hash: String) -> CoreResult<User> {
        let mut table = self.table.write();
        if table.by_username.contains_key(username) {
            return Err(CoreError::Conflict("username already exists".to_string()));
        }

        table.next_id += 1;
        let user = User {
            id: table.next_id,
            username: username.to_string(),
            password_hash,
            created_at: Utc::now(),
        };
        table.by_username.insert(user.username.clone(), user.id);
        table.rows.insert(user.id, user.clone());
        tracing::debug!(user_id = user.id, "user created");
        Ok(user)
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        let table = self.table.read();
        let id = table.by_username.get(username)?;
        table.rows.get(id).cloned()
    }

    pub fn exists(&self, username: &str) -> bool {
        self.table.read().by_username.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_increasing_ids() {
        let store = UserStore::new();
        let a = store.create("alice", "h1".to_string()).unwrap();
        let b = store.create("bob", "h2".to_string()).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn duplicate_username_conflicts() {
        let store = UserStore::new();
        store.create("alice", "h1".to_string()).unwrap();
        let err = store.create("alice", "h2".to_string()).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn lookup_by_name() {
        let store = UserStore::new();
        let alice = store.create("alice", "h1".to_string()).unwrap();
        let bob = store.create("bob", "h2".to_string()).unwrap();
        assert_eq!(store.find_by_username("alice"), Some(alice));
        assert_eq!(store.find_by_username("bob").map(|u| u.id), Some(bob.id));
        assert!(store.exists("alice"));
        assert!(store.find_by_username("nobody").is_none());
    }
}
