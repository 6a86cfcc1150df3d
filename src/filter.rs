use crate::{operation::OpType, predicate::Predicate};

/// One dimension of the filter panel.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Selector<T> {
    /// No constraint.
    All,
    /// Keep operations matching any of the listed items.
    Selected(Vec<T>),
    /// Drop operations matching any of the listed items.
    Exclude(Vec<T>),
}

impl<T> Default for Selector<T> {
    fn default() -> Self {
        Selector::All
    }
}

/// Filter state as picked by the user.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Filter {
    pub search: Option<String>,
    pub types: Selector<OpType>,
    /// The empty string stands for "uncategorized".
    pub categories: Selector<String>,
    pub accounts: Selector<String>,
    pub tags: Selector<String>,
}

fn category_atom(name: &str) -> Predicate {
    if name.is_empty() {
        Predicate::Uncategorized
    } else {
        Predicate::category(name)
    }
}

/// `Selected([])` keeps nothing, `Exclude([])` drops nothing.
fn selector<T>(sel: &Selector<T>, atom: impl Fn(&T) -> Predicate) -> Option<Predicate> {
    match sel {
        Selector::All => None,
        Selector::Selected(items) if items.is_empty() => Some(Predicate::not(Predicate::Any)),
        Selector::Selected(items) => Some(Predicate::Or(items.iter().map(atom).collect())),
        Selector::Exclude(items) if items.is_empty() => None,
        Selector::Exclude(items) => Some(Predicate::not(Predicate::Or(
            items.iter().map(atom).collect(),
        ))),
    }
}

/// Operations without categories are never dropped by the category selector.
fn categories_selector(sel: &Selector<String>) -> Option<Predicate> {
    let carve_out = || {
        vec![
            Predicate::Type(OpType::Transfer),
            Predicate::Type(OpType::Adjustment),
        ]
    };

    match sel {
        Selector::All => None,
        Selector::Selected(items) => {
            let mut any = items.iter().map(|c| category_atom(c)).collect::<Vec<_>>();
            any.extend(carve_out());
            Some(Predicate::Or(any))
        }
        Selector::Exclude(items) if items.is_empty() => None,
        Selector::Exclude(items) => {
            let mut any = vec![Predicate::not(Predicate::Or(
                items.iter().map(|c| category_atom(c)).collect(),
            ))];
            any.extend(carve_out());
            Some(Predicate::Or(any))
        }
    }
}

pub fn filter_to_predicate(filter: &Filter) -> Predicate {
    let parts: Vec<Predicate> = [
        filter
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(Predicate::comment),
        selector(&filter.types, |t| Predicate::Type(*t)),
        categories_selector(&filter.categories),
        selector(&filter.accounts, |a| Predicate::account(a.as_str())),
        selector(&filter.tags, |t| Predicate::tag(t.as_str())),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        Predicate::Any
    } else {
        Predicate::And(parts)
    }
}
