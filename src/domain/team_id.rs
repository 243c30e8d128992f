use super::ValidationError;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TeamId(i64);

impl TeamId {
    pub fn parse(id: &str) -> Result<Self, ValidationError> {
        let parsed = id.parse::<i64>().map_err(|e| {
            ValidationError::new(format!("Invalid team ID: {e}"))
        })?;
        Ok(Self(parsed))
    }

    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl AsRef<i64> for TeamId {
    fn as_ref(&self) -> &i64 {
        &self.0
    }
}

#[test]
fn test_invalid_team_ids() {
    let result = TeamId::parse("");
    let error = result.expect_err("empty team ID");
    assert_eq!(
        error.as_ref(),
        "Invalid team ID: cannot parse integer from empty string"
    );
}
