pub mod json_file;
pub mod memory;

use crate::models::user::{StatusAction, UserRecord};
use thiserror::Error;

pub use json_file::JsonFileStore;
pub use memory::MemoryUserStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read user file: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to write user file: {0}")]
    Write(#[source] std::io::Error),

    #[error("User file is not a JSON array of users: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Persistent list of portal accounts
///
/// Implementations hold the whole list as one unit. `modify` is the only
/// mutation primitive: it loads the list, hands it to the closure and saves
/// it if the closure reports a change, with no other `modify` interleaved.
pub trait UserStore: Send + Sync {
    /// Current list of users; a store that was never written is empty
    fn load(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Run a read-modify-write cycle
    ///
    /// The closure returns `true` when the list must be persisted.
    fn modify(
        &self,
        mutate: &mut dyn FnMut(&mut Vec<UserRecord>) -> bool,
    ) -> Result<(), StoreError>;

    fn append(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut record = Some(record);
        self.modify(&mut |users| match record.take() {
            Some(record) => {
                users.push(record);
                true
            }
            None => false,
        })
    }

    fn find(&self, key: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.load()?.into_iter().find(|user| user.matches(key)))
    }

    /// Remove every record whose key matches, returning how many went
    ///
    /// The list is rewritten even when nothing matched.
    fn remove(&self, key: &str) -> Result<usize, StoreError> {
        let mut removed = 0;
        self.modify(&mut |users| {
            let before = users.len();
            users.retain(|user| !user.matches(key));
            removed = before - users.len();
            true
        })?;
        Ok(removed)
    }

    /// Apply a status action to the first record matching `key`
    ///
    /// Returns the updated record, or `None` (store untouched) when no record
    /// matches.
    fn update_status(
        &self,
        key: &str,
        action: StatusAction,
        now: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut updated = None;
        self.modify(&mut |users| match users.iter_mut().find(|user| user.matches(key)) {
            Some(user) => {
                user.apply(action, now);
                updated = Some(user.clone());
                true
            }
            None => false,
        })?;
        Ok(updated)
    }
}
