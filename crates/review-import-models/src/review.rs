use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Moderation state of a stored review
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Approved,
    Pending,
    Spam,
    Trash,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: u64,
    pub product_id: u64,
    pub author_name: String,
    pub author_email: String,
    pub author_ip: String,
    pub content: String,
    pub rating: u8, // 1-5, stored as metadata on the host
    pub status: ModerationStatus,
    pub verified: bool,
    /// Owning account, 0 for guests
    pub user_id: u64,
    pub created_at: NaiveDateTime, // timezone-naive, as the host stores it
}

/// Everything needed to insert a review; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub product_id: u64,
    pub author_name: String,
    pub author_email: String,
    pub author_ip: String,
    pub content: String,
    pub rating: u8,
    pub status: ModerationStatus,
    pub verified: bool,
    pub user_id: u64,
    pub created_at: NaiveDateTime,
}

impl NewReview {
    pub fn into_review(self, id: u64) -> Review {
        Review {
            id,
            product_id: self.product_id,
            author_name: self.author_name,
            author_email: self.author_email,
            author_ip: self.author_ip,
            content: self.content,
            rating: self.rating,
            status: self.status,
            verified: self.verified,
            user_id: self.user_id,
            created_at: self.created_at,
        }
    }
}
