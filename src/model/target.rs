use serde::{Deserialize, Serialize};

use crate::model::Id;

/// A concrete entity a property value is attached to.
///
/// `category` is what property definitions list in their `targets`
/// (e.g. "user", "project"); `id` identifies the entity within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetRef {
    #[serde(rename = "type")]
    pub category: String,
    pub id: Id,
}

impl TargetRef {
    pub fn new(category: impl Into<String>, id: impl Into<Id>) -> Self {
        Self {
            category: category.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.category, self.id)
    }
}
