//! Narrow views onto the host platform's record store.
//!
//! The importer only ever talks to these traits, so the host (or a test
//! fake) decides how products, users and reviews are actually persisted.

use crate::error::StoreError;
use review_import_models::{NewReview, NewUser, Product, Review, User};

pub trait ProductRepository: Send + Sync {
    /// Exact, case-sensitive SKU match
    fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError>;
}

pub trait UserRepository: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    fn username_exists(&self, username: &str) -> Result<bool, StoreError>;

    fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
}

pub trait ReviewRepository: Send + Sync {
    /// First review on `product_id` by `email`, whatever its moderation status
    fn find_by_product_and_email(&self, product_id: u64, email: &str) -> Result<Option<Review>, StoreError>;

    /// Store a new review and return its id
    fn insert(&self, review: NewReview) -> Result<u64, StoreError>;

    /// Replace body and rating only; author, date and moderation stay as they are
    fn update_content(&self, review_id: u64, content: &str, rating: u8) -> Result<(), StoreError>;
}
