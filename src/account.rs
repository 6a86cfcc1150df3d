use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub name: String,
    pub currency: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub deleted: bool,
    pub last_modified: DateTime<Utc>,
}

impl Account {
    pub fn new<N: Into<String>, C: Into<String>>(name: N, currency: C, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            currency: currency.into(),
            hidden: false,
            deleted: false,
            last_modified: now,
        }
    }

    /// Accounts are never renamed in place: the old record becomes a tombstone
    /// and a fresh record carries the new name.
    pub fn rename<N: Into<String>>(&self, name: N, now: DateTime<Utc>) -> (Self, Self) {
        let tombstone = self.delete(now);
        let renamed = Self {
            name: name.into(),
            deleted: false,
            last_modified: now,
            ..self.clone()
        };

        (tombstone, renamed)
    }

    pub fn delete(&self, now: DateTime<Utc>) -> Self {
        Self {
            deleted: true,
            last_modified: now,
            ..self.clone()
        }
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub currency: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub deleted: bool,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub yearly_goal: Option<f64>,
}

impl Category {
    pub fn new<N: Into<String>, C: Into<String>>(name: N, currency: C, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            currency: currency.into(),
            hidden: false,
            deleted: false,
            last_modified: now,
            yearly_goal: None,
        }
    }

    pub fn with_goal(mut self, goal: f64) -> Self {
        self.yearly_goal = Some(goal);
        self
    }

    pub fn rename<N: Into<String>>(&self, name: N, now: DateTime<Utc>) -> (Self, Self) {
        let tombstone = self.delete(now);
        let renamed = Self {
            name: name.into(),
            deleted: false,
            last_modified: now,
            ..self.clone()
        };

        (tombstone, renamed)
    }

    pub fn delete(&self, now: DateTime<Utc>) -> Self {
        Self {
            deleted: true,
            last_modified: now,
            ..self.clone()
        }
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}
