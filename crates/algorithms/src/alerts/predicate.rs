//! Which regions raise an alert

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Decides from a region's predicted label whether it raises an alert
pub trait AlertPredicate {
    fn triggers(&self, label: &str) -> bool;
}

/// Alert on any label in a fixed set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertLabels(BTreeSet<String>);

impl AlertLabels {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(labels.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// `["stressed"]`
impl Default for AlertLabels {
    fn default() -> Self {
        Self::new(["stressed"])
    }
}

impl AlertPredicate for AlertLabels {
    fn triggers(&self, label: &str) -> bool {
        self.0.contains(label)
    }
}

impl<F> AlertPredicate for F
where
    F: Fn(&str) -> bool,
{
    fn triggers(&self, label: &str) -> bool {
        self(label)
    }
}
