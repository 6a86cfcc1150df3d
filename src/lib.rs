use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod account;
pub mod error;
pub mod filter;
pub mod interval;
pub mod lexer;
pub mod money;
pub mod operation;
pub mod parser;
pub mod predicate;
pub mod stats;
pub mod store;
pub mod syntax;
pub mod utils;

use account::{Account, Category};
use operation::Operation;
use store::OperationStore;

pub use error::StatsError;
pub use predicate::Predicate;
pub use stats::{Reducer, Sweep, TimeSpan};

/// Everything a user has recorded, as exported to a data file.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Dataset {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read data file {}", path.display()))?;

        serde_json::from_str(&content).with_context(|| format!("Failed to parse data file {}", path.display()))
    }

    /// Loads the operation log into a fresh store.
    pub fn store(&self) -> OperationStore {
        OperationStore::loaded(self.operations.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OpType;

    #[test]
    fn test_dataset_from_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("data.json");
        fs::write(
            &path,
            r#"{
                "accounts": [
                    {"name": "cash", "currency": "USD", "lastModified": "2020-01-01T00:00:00Z"},
                    {"name": "old", "currency": "USD", "deleted": true, "lastModified": "2020-01-01T00:00:00Z"}
                ],
                "operations": [
                    {
                        "type": "expense",
                        "id": "1",
                        "lastModified": "2020-01-01T00:00:00Z",
                        "date": "2020-01-02",
                        "currency": "USD",
                        "amount": -3.5,
                        "account": {"name": "cash", "amount": -3.5},
                        "categories": [{"name": "Food", "amount": -3.5}]
                    },
                    {"type": "deleted", "id": "2"}
                ]
            }"#,
        )?;

        let data = Dataset::from_file(&path)?;
        let store = data.store();
        let snapshot = store.snapshot()?;

        assert_eq!(data.accounts.iter().filter(|a| a.is_active()).count(), 1);
        assert!(data.categories.is_empty());
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1].op_type(), OpType::Expense);

        Ok(())
    }

    #[test]
    fn test_dataset_missing_file() {
        let err = Dataset::from_file("/nonexistent/data.json").unwrap_err();

        assert!(err.to_string().contains("Failed to read data file"));
    }
}
