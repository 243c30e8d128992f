use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation and modification timestamps shared by every stored entity.
///
/// `created_date` is fixed when the entity is first persisted; stores call
/// [`Audit::on_update`] before writing a changed entity back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    created_date: DateTime<Utc>,
    updated_date: DateTime<Utc>,
}

impl Audit {
    pub fn on_persist() -> Self {
        let now = Utc::now();
        Self {
            created_date: now,
            updated_date: now,
        }
    }

    pub fn on_update(&mut self) {
        self.updated_date = Utc::now();
    }

    pub fn restore(
        created_date: DateTime<Utc>,
        updated_date: DateTime<Utc>,
    ) -> Self {
        Self {
            created_date,
            updated_date,
        }
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }

    pub fn updated_date(&self) -> DateTime<Utc> {
        self.updated_date
    }
}

#[test]
fn test_update_keeps_created_date() {
    let mut audit = Audit::on_persist();
    assert_eq!(audit.created_date(), audit.updated_date());

    let created = audit.created_date();
    std::thread::sleep(std::time::Duration::from_millis(2));
    audit.on_update();

    assert_eq!(audit.created_date(), created);
    assert!(audit.updated_date() > created);
}
