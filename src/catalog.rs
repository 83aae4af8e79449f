//! Category catalog
//!
//! Ordered category labels per operation type, loaded once at startup and
//! shared read-only. Order is presentation order.

use crate::callback;
use crate::state_machine::OperationType;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

pub const DEFAULT_INCOME_CATEGORIES: &[&str] =
    &["Salary", "Freelance", "Gifts", "Investments", "Other"];
pub const DEFAULT_EXPENSE_CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Housing",
    "Health",
    "Entertainment",
    "Other",
];

/// Invalid catalog configuration. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("No {0} categories configured")]
    Empty(OperationType),
    #[error("Blank {0} category label")]
    BlankLabel(OperationType),
    #[error("Duplicate {operation_type} category: {label}")]
    DuplicateLabel {
        operation_type: OperationType,
        label: String,
    },
    #[error("{operation_type} category too long for a callback token: {label}")]
    LabelTooLong {
        operation_type: OperationType,
        label: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCatalog {
    income: Vec<String>,
    expense: Vec<String>,
}

impl CategoryCatalog {
    /// Build a validated catalog
    pub fn new(income: Vec<String>, expense: Vec<String>) -> Result<Self, CatalogError> {
        validate(OperationType::Income, &income)?;
        validate(OperationType::Expense, &expense)?;
        Ok(Self { income, expense })
    }

    pub fn labels(&self, operation_type: OperationType) -> &[String] {
        match operation_type {
            OperationType::Income => &self.income,
            OperationType::Expense => &self.expense,
        }
    }

    pub fn contains(&self, operation_type: OperationType, label: &str) -> bool {
        self.labels(operation_type).iter().any(|l| l == label)
    }
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        let owned = |labels: &[&str]| labels.iter().map(ToString::to_string).collect();
        Self {
            income: owned(DEFAULT_INCOME_CATEGORIES),
            expense: owned(DEFAULT_EXPENSE_CATEGORIES),
        }
    }
}

fn validate(operation_type: OperationType, labels: &[String]) -> Result<(), CatalogError> {
    if labels.is_empty() {
        return Err(CatalogError::Empty(operation_type));
    }
    let mut seen = HashSet::new();
    for label in labels {
        if label.trim().is_empty() {
            return Err(CatalogError::BlankLabel(operation_type));
        }
        if callback::encode(operation_type, label).len() > callback::MAX_TOKEN_LEN {
            return Err(CatalogError::LabelTooLong {
                operation_type,
                label: label.clone(),
            });
        }
        if !seen.insert(label.as_str()) {
            return Err(CatalogError::DuplicateLabel {
                operation_type,
                label: label.clone(),
            });
        }
    }
    Ok(())
}
