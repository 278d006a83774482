use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header carrying the remaining requests for the current user
pub const USER_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Header carrying the remaining requests for the whole organization
pub const ORGANIZATION_REMAINING_HEADER: &str = "x-company-ratelimit-remaining";

/// Identifies one of the two request budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    User,
    Organization,
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Organization => write!(f, "organization"),
        }
    }
}

/// Remaining request counts reported by the source service
///
/// `None` means unbounded: nothing has been reported yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateBudget {
    pub user_remaining: Option<i64>,
    pub organization_remaining: Option<i64>,
}

impl RateBudget {
    /// Creates a budget with both counters unbounded
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Returns the first budget that is at or below zero
    pub fn exhausted(&self) -> Option<Budget> {
        if self.user_remaining.is_some_and(|n| n <= 0) {
            return Some(Budget::User);
        }
        if self.organization_remaining.is_some_and(|n| n <= 0) {
            return Some(Budget::Organization);
        }
        None
    }

    /// Updates the counters from response headers
    ///
    /// A missing or unparsable header leaves its counter unchanged. Returns
    /// true if at least one counter was updated.
    pub fn update_from_headers(&mut self, headers: &HeaderMap) -> bool {
        let user = parse_header(headers, USER_REMAINING_HEADER);
        let organization = parse_header(headers, ORGANIZATION_REMAINING_HEADER);

        if let Some(n) = user {
            self.user_remaining = Some(n);
        }
        if let Some(n) = organization {
            self.organization_remaining = Some(n);
        }

        user.is_some() || organization.is_some()
    }
}

fn parse_header(headers: &HeaderMap, name: &str) -> Option<i64> {
    let value = headers.get(name)?;
    match value.to_str().ok().and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(n) => Some(n),
        None => {
            tracing::warn!("Ignoring unparsable {} header: {:?}", name, value);
            None
        }
    }
}
