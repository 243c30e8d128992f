use super::{ValidationError, MAX_NAME_LENGTH};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamName(String);

impl TeamName {
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        match name.chars().count() {
            x if x < 1 => Err(ValidationError::new(
                "Team name cannot be empty".to_string(),
            )),
            x if x > MAX_NAME_LENGTH => Err(ValidationError::new(
                "Max name length is 255 characters".to_string(),
            )),
            _ => Ok(Self(name.to_owned())),
        }
    }
}

impl AsRef<String> for TeamName {
    fn as_ref(&self) -> &String {
        &self.0
    }
}

#[test]
fn test_valid_team_names() {
    let valid_names = ["a".to_string(), "a".repeat(255)];
    for valid_name in valid_names.iter() {
        let parsed = TeamName::parse(valid_name)
            .expect("Failed to parse valid team name");

        assert_eq!(parsed.as_ref(), valid_name);
    }
}

#[test]
fn test_short_team_names() {
    let result = TeamName::parse("");
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().as_ref(), "Team name cannot be empty");
}

#[test]
fn test_long_team_names() {
    let result = TeamName::parse(&"a".repeat(256));
    assert!(result.is_err());
    assert_eq!(
        result.unwrap_err().as_ref(),
        "Max name length is 255 characters"
    );
}
