use std::cmp::Ordering;
use std::fmt::{self, Display};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Income,
    Expense,
    Transfer,
    Adjustment,
    Deleted,
}

impl OpType {
    pub const ALL: [OpType; 4] = [
        OpType::Income,
        OpType::Expense,
        OpType::Transfer,
        OpType::Adjustment,
    ];

    pub fn from_str(v: &str) -> Option<Self> {
        match v {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "transfer" => Some(Self::Transfer),
            "adjustment" => Some(Self::Adjustment),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OpType::Income => "income",
            OpType::Expense => "expense",
            OpType::Transfer => "transfer",
            OpType::Adjustment => "adjustment",
            OpType::Deleted => "deleted",
        }
    }

    /// Position in the log order among operations sharing a date.
    fn priority(&self) -> u8 {
        match self {
            OpType::Income => 0,
            OpType::Transfer => 1,
            OpType::Expense => 2,
            OpType::Adjustment => 3,
            OpType::Deleted => 4,
        }
    }
}

impl Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One side of an operation as seen by an account, in that account's currency.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AccountRef {
    pub name: String,
    pub amount: f64,
}

impl AccountRef {
    pub fn new<T: Into<String>>(name: T, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub name: String,
    pub amount: f64,
}

impl CategoryRef {
    pub fn new<T: Into<String>>(name: T, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Fields shared by every live operation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Head {
    pub id: String,
    pub last_modified: DateTime<Utc>,
    pub date: NaiveDate,
    pub currency: String,
    pub amount: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Income or expense: money entering or leaving through categories.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Booked {
    #[serde(flatten)]
    pub head: Head,
    pub account: AccountRef,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    #[serde(flatten)]
    pub head: Head,
    pub account: AccountRef,
    pub to_account: AccountRef,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Adjustment {
    #[serde(flatten)]
    pub head: Head,
    pub account: AccountRef,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    Income(Booked),
    Expense(Booked),
    Transfer(Transfer),
    Adjustment(Adjustment),
    Deleted { id: String },
}

impl Operation {
    pub fn id(&self) -> &str {
        match self {
            Operation::Income(b) | Operation::Expense(b) => &b.head.id,
            Operation::Transfer(t) => &t.head.id,
            Operation::Adjustment(a) => &a.head.id,
            Operation::Deleted { id } => id,
        }
    }

    pub fn op_type(&self) -> OpType {
        match self {
            Operation::Income(_) => OpType::Income,
            Operation::Expense(_) => OpType::Expense,
            Operation::Transfer(_) => OpType::Transfer,
            Operation::Adjustment(_) => OpType::Adjustment,
            Operation::Deleted { .. } => OpType::Deleted,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Operation::Deleted { .. })
    }

    pub fn head(&self) -> Option<&Head> {
        match self {
            Operation::Income(b) | Operation::Expense(b) => Some(&b.head),
            Operation::Transfer(t) => Some(&t.head),
            Operation::Adjustment(a) => Some(&a.head),
            Operation::Deleted { .. } => None,
        }
    }

    fn head_mut(&mut self) -> Option<&mut Head> {
        match self {
            Operation::Income(b) | Operation::Expense(b) => Some(&mut b.head),
            Operation::Transfer(t) => Some(&mut t.head),
            Operation::Adjustment(a) => Some(&mut a.head),
            Operation::Deleted { .. } => None,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.head().map(|h| h.date)
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.head().map(|h| h.last_modified)
    }

    pub fn amount(&self) -> f64 {
        self.head().map(|h| h.amount).unwrap_or(0.0)
    }

    pub fn currency(&self) -> Option<&str> {
        self.head().map(|h| h.currency.as_str())
    }

    pub fn tags(&self) -> &[String] {
        self.head().map(|h| h.tags.as_slice()).unwrap_or(&[])
    }

    pub fn comment(&self) -> Option<&str> {
        self.head().and_then(|h| h.comment.as_deref())
    }

    /// Primary (source) account.
    pub fn account(&self) -> Option<&AccountRef> {
        match self {
            Operation::Income(b) | Operation::Expense(b) => Some(&b.account),
            Operation::Transfer(t) => Some(&t.account),
            Operation::Adjustment(a) => Some(&a.account),
            Operation::Deleted { .. } => None,
        }
    }

    pub fn to_account(&self) -> Option<&AccountRef> {
        match self {
            Operation::Transfer(t) => Some(&t.to_account),
            _ => None,
        }
    }

    /// Category split, `None` for operations that cannot carry categories.
    pub fn categories(&self) -> Option<&[CategoryRef]> {
        match self {
            Operation::Income(b) | Operation::Expense(b) => Some(&b.categories),
            _ => None,
        }
    }

    /// Every account side touched by this operation, with the amount booked on it.
    pub fn account_sides(&self) -> impl Iterator<Item = &AccountRef> {
        self.account().into_iter().chain(self.to_account())
    }

    /// Points every reference to account `from` at `to`. Returns whether anything changed.
    pub fn rename_account(&mut self, from: &str, to: &str) -> bool {
        let mut changed = false;
        let mut rename = |acc: &mut AccountRef| {
            if acc.name == from {
                acc.name = to.to_string();
                changed = true;
            }
        };

        match self {
            Operation::Income(b) | Operation::Expense(b) => rename(&mut b.account),
            Operation::Transfer(t) => {
                rename(&mut t.account);
                rename(&mut t.to_account);
            }
            Operation::Adjustment(a) => rename(&mut a.account),
            Operation::Deleted { .. } => {}
        }

        changed
    }

    pub fn rename_category(&mut self, from: &str, to: &str) -> bool {
        let mut changed = false;

        if let Operation::Income(b) | Operation::Expense(b) = self {
            for cat in b.categories.iter_mut().filter(|c| c.name == from) {
                cat.name = to.to_string();
                changed = true;
            }
        }

        changed
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        if let Some(head) = self.head_mut() {
            head.last_modified = now;
        }
    }
}

/// Total order over the operation log.
///
/// Tombstones come first (by id), then live operations by date, type priority,
/// currency, absolute amount, and finally id descending.
pub fn compare(a: &Operation, b: &Operation) -> Ordering {
    match (a.head(), b.head()) {
        (None, None) => a.id().cmp(b.id()),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(ha), Some(hb)) => ha
            .date
            .cmp(&hb.date)
            .then_with(|| a.op_type().priority().cmp(&b.op_type().priority()))
            .then_with(|| ha.currency.cmp(&hb.currency))
            .then_with(|| ha.amount.abs().total_cmp(&hb.amount.abs()))
            .then_with(|| hb.id.cmp(&ha.id)),
    }
}

pub fn sort_operations(operations: &mut [Operation]) {
    operations.sort_by(compare);
}
