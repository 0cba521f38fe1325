use crate::models::user::UserRecord;
use crate::stores::{StoreError, UserStore};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// User directory kept as a single pretty-printed JSON array on disk
///
/// Every mutation rewrites the whole file. Writes go to a temporary file in
/// the same directory which is then renamed over the original, so readers
/// never observe a half-written list. Read-modify-write cycles are
/// serialised within the process.
///
/// Records a mutation did not touch are written back exactly as they were
/// read; changed records only get their changed keys rewritten.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<Vec<Value>, StoreError> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Read(e)),
        };

        if content.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&content)?)
    }

    fn write_file(&self, users: &[Value]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let tmp = NamedTempFile::new_in(dir).map_err(StoreError::Write)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, users)?;
            writer.write_all(b"\n").map_err(StoreError::Write)?;
            writer.flush().map_err(StoreError::Write)?;
        }
        tmp.as_file().sync_all().map_err(StoreError::Write)?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::Write(e.error))?;

        Ok(())
    }
}

fn parse_records(raw: &[Value]) -> Result<Vec<UserRecord>, StoreError> {
    raw.iter()
        .map(|value| UserRecord::deserialize(value).map_err(StoreError::from))
        .collect()
}

/// Stored form of `after`, a changed version of the record `raw` was read as
fn merge_changes(raw: &Value, before: &UserRecord, after: &UserRecord) -> Result<Value, StoreError> {
    let (Value::Object(mut merged), Value::Object(old), Value::Object(new)) = (
        raw.clone(),
        serde_json::to_value(before)?,
        serde_json::to_value(after)?,
    ) else {
        return Ok(serde_json::to_value(after)?);
    };

    for key in old.keys() {
        if !new.contains_key(key) {
            merged.shift_remove(key);
        }
    }
    for (key, value) in new {
        if old.get(&key) != Some(&value) {
            merged.insert(key, value);
        }
    }

    Ok(Value::Object(merged))
}

/// Map the mutated list back onto the values read from disk
///
/// Unchanged records reuse their stored value, records with a known key get
/// their changes merged in, anything else is new.
fn reconcile(
    raw: &[Value],
    parsed: &[UserRecord],
    users: &[UserRecord],
) -> Result<Vec<Value>, StoreError> {
    let mut used = vec![false; raw.len()];
    let mut values: Vec<Option<Value>> = vec![None; users.len()];

    for (slot, user) in values.iter_mut().zip(users) {
        if let Some(i) = (0..parsed.len()).find(|&i| !used[i] && parsed[i] == *user) {
            used[i] = true;
            *slot = Some(raw[i].clone());
        }
    }

    for (slot, user) in values.iter_mut().zip(users) {
        if slot.is_some() {
            continue;
        }
        let original = (0..parsed.len()).find(|&i| !used[i] && parsed[i].matches(user.key()));
        *slot = Some(match original {
            Some(i) => {
                used[i] = true;
                merge_changes(&raw[i], &parsed[i], user)?
            }
            None => serde_json::to_value(user)?,
        });
    }

    Ok(values.into_iter().flatten().collect())
}

impl UserStore for JsonFileStore {
    fn load(&self) -> Result<Vec<UserRecord>, StoreError> {
        parse_records(&self.read_raw()?)
    }

    fn modify(
        &self,
        mutate: &mut dyn FnMut(&mut Vec<UserRecord>) -> bool,
    ) -> Result<(), StoreError> {
        // A panicked writer leaves the file intact thanks to the rename
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let raw = self.read_raw()?;
        let parsed = parse_records(&raw)?;
        let mut users = parsed.clone();

        if mutate(&mut users) {
            let values = reconcile(&raw, &parsed, &users)?;
            self.write_file(&values)?;
            tracing::debug!(path = %self.path.display(), users = values.len(), "User file written");
        }
        Ok(())
    }
}
