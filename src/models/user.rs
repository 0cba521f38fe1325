use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A portal account as persisted in the user directory
///
/// Records written by other tools may carry `null`, numbers or missing keys
/// in place of text; those read as text (missing and `null` as empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Creation instant as fractional UNIX seconds
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    /// Student or employee number supplied at signup
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    /// Generated institutional address
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub personal_email: String,
    /// Generated password, stored as issued
    #[serde(default, deserialize_with = "lenient::text")]
    pub password: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub section: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub verified: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub rejected: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub banned: bool,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub verified_at: Option<String>,
    /// Remote link or local path of the registration attachment
    #[serde(default, deserialize_with = "lenient::text")]
    pub raf_path: String,
    /// Keys written by other tools, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(scalar_text(Value::deserialize(deserializer)?).filter(|s| !s.is_empty()))
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Value::String(s) => matches!(s.as_str(), "true" | "1"),
            _ => false,
        })
    }
}

/// Status derived from the three record flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Verified,
    Rejected,
    Banned,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Verified => "verified",
            UserStatus::Rejected => "rejected",
            UserStatus::Banned => "banned",
        }
    }
}

/// Administrator decision applied to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Accept,
    Reject,
    Ban,
}

impl StatusAction {
    /// Past-tense verb used in confirmation messages
    pub fn past_tense(self) -> &'static str {
        match self {
            StatusAction::Accept => "accepted",
            StatusAction::Reject => "rejected",
            StatusAction::Ban => "banned",
        }
    }

    pub fn target(self) -> UserStatus {
        match self {
            StatusAction::Accept => UserStatus::Verified,
            StatusAction::Reject => UserStatus::Rejected,
            StatusAction::Ban => UserStatus::Banned,
        }
    }
}

impl FromStr for StatusAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(StatusAction::Accept),
            "reject" => Ok(StatusAction::Reject),
            "ban" => Ok(StatusAction::Ban),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

impl fmt::Display for StatusAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusAction::Accept => "accept",
            StatusAction::Reject => "reject",
            StatusAction::Ban => "ban",
        };
        f.write_str(s)
    }
}

impl UserRecord {
    /// Key used by admin requests: `user_id`, or `id` for records without one
    pub fn key(&self) -> &str {
        if self.user_id.is_empty() {
            &self.id
        } else {
            &self.user_id
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        self.key() == key
    }

    pub fn status(&self) -> UserStatus {
        if self.banned {
            UserStatus::Banned
        } else if self.rejected {
            UserStatus::Rejected
        } else if self.verified {
            UserStatus::Verified
        } else {
            UserStatus::Pending
        }
    }

    /// Move the record to the action's target state
    ///
    /// Exactly one flag ends up set. Accepting stamps `verified_at`;
    /// other transitions leave any earlier stamp in place. A `status` key
    /// kept from other tools follows the flags.
    pub fn apply(&mut self, action: StatusAction, now: &str) {
        self.verified = action == StatusAction::Accept;
        self.rejected = action == StatusAction::Reject;
        self.banned = action == StatusAction::Ban;

        if action == StatusAction::Accept {
            self.verified_at = Some(now.to_string());
        }

        let current = Value::from(self.status().as_str());
        if let Some(status) = self.extra.get_mut("status") {
            *status = current;
        }
    }
}
