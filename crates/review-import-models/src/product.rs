use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: u64,
    pub sku: String,
    pub name: String,
    /// Set when this product is a variant; reviews go to the parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
}

impl Product {
    pub fn is_variant(&self) -> bool {
        self.parent_id.is_some()
    }

    /// The id a review for this product must be attached to
    pub fn review_target_id(&self) -> u64 {
        self.parent_id.unwrap_or(self.id)
    }
}
