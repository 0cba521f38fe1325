use crate::models::user::UserRecord;
use crate::stores::{StoreError, UserStore};
use std::sync::Mutex;

/// Volatile user directory, used by tests and dry runs
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }
}

impl UserStore for MemoryUserStore {
    fn load(&self) -> Result<Vec<UserRecord>, StoreError> {
        let users = self.users.lock().unwrap_or_else(|p| p.into_inner());
        Ok(users.clone())
    }

    fn modify(
        &self,
        mutate: &mut dyn FnMut(&mut Vec<UserRecord>) -> bool,
    ) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap_or_else(|p| p.into_inner());
        let mut working = users.clone();
        if mutate(&mut working) {
            *users = working;
        }
        Ok(())
    }
}
