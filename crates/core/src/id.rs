//! Identifiers for tracked goals.

use serde::{Deserialize, Serialize};

/// Identifier of a goal whose progress is tracked.
///
/// Goal ids are owned by the external goal registry, so this is an opaque
/// string rather than a generated id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(String);

impl GoalId {
    /// Create a goal id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GoalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for GoalId {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(crate::CoreError::InvalidGoalId(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for GoalId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for GoalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_id_parse_trims() {
        let id: GoalId = "  launch-v2 ".parse().unwrap();
        assert_eq!(id.as_str(), "launch-v2");
        assert!("   ".parse::<GoalId>().is_err());
    }

    #[test]
    fn test_goal_id_serializes_as_plain_string() {
        let id = GoalId::new("g1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"g1\"");
    }
}
