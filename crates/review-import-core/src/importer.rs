use crate::context::{Clock, ImportContext};
use crate::error::ImportError;
use crate::repository::{ProductRepository, ReviewRepository, UserRepository};
use crate::sanitize::{
    is_valid_email, parse_review_date, resolve_author_ip, sanitize_email, sanitize_review_text,
    username_from_email, validate_star_rating,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use review_import_config::ImportSettings;
use review_import_models::{ImportRow, ModerationStatus, NewReview, NewUser, User, UserRole};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fields every row must carry, in the order they are checked
pub const REQUIRED_FIELDS: [&str; 5] = [
    "product_sku",
    "author_name",
    "author_email",
    "review_text",
    "review_stars",
];

const GENERATED_PASSWORD_LENGTH: usize = 24;

/// What a successful row did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Created(u64),
    Updated(u64),
}

impl ImportOutcome {
    pub fn review_id(&self) -> u64 {
        match self {
            Self::Created(id) | Self::Updated(id) => *id,
        }
    }
}

/// A failed row, with the row itself kept for diagnosis
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatchRowError {
    /// Position within the batch passed to `import_reviews`
    pub index: usize,
    pub row_number: usize,
    pub code: &'static str,
    pub message: String,
    pub row: ImportRow,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BatchResult {
    pub success_count: usize,
    pub updated_count: usize,
    pub errors: Vec<BatchRowError>,
}

/// Turns normalized rows into product reviews
pub struct ReviewImporter {
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
    reviews: Arc<dyn ReviewRepository>,
    settings: ImportSettings,
    clock: Clock,
}

impl ReviewImporter {
    pub fn new(context: &ImportContext) -> Self {
        Self {
            products: context.products.clone(),
            users: context.users.clone(),
            reviews: context.reviews.clone(),
            settings: context.settings.clone(),
            clock: context.clock,
        }
    }

    /// Import one row, creating a review or updating the reviewer's existing
    /// review on the same product.
    pub fn import_review(&self, row: &ImportRow) -> Result<ImportOutcome, ImportError> {
        for field in REQUIRED_FIELDS {
            if row.value(field).is_none() {
                return Err(ImportError::missing_field(field));
            }
        }

        let rating =
            validate_star_rating(required(row, "review_stars")).ok_or_else(ImportError::invalid_rating)?;

        let sku = required(row, "product_sku");
        let product = self
            .products
            .find_by_sku(sku)
            .map_err(|e| ImportError::store("Product lookup failed", &e))?
            .ok_or_else(|| ImportError::product_not_found(sku))?;
        let product_id = product.review_target_id();
        if product.is_variant() {
            debug!("SKU {} is a variant, attaching review to parent {}", sku, product_id);
        }

        let raw_email = required(row, "author_email");
        let email = sanitize_email(raw_email);
        if !is_valid_email(&email) {
            return Err(ImportError::invalid_email(raw_email));
        }

        let content = sanitize_review_text(required(row, "review_text"));
        if content.chars().count() < self.settings.min_review_length {
            return Err(ImportError::review_too_short(self.settings.min_review_length));
        }

        let author_ip = resolve_author_ip(row.value("author_ip"), self.settings.effective_default_ip());
        let created_at = parse_review_date(row.value("review_date"), (self.clock)());

        let author_name = required(row, "author_name");
        let user = self.resolve_user(&email, author_name)?;

        let existing = self
            .reviews
            .find_by_product_and_email(product_id, &email)
            .map_err(|e| ImportError::store("Review lookup failed", &e))?;

        if let Some(existing) = existing {
            self.reviews.update_content(existing.id, &content, rating).map_err(|e| {
                warn!("Row {}: updating review {} failed: {}", row.row_number, existing.id, e);
                ImportError::review_update_failed(existing.id)
            })?;
            debug!("Row {}: updated review {} on product {}", row.row_number, existing.id, product_id);
            return Ok(ImportOutcome::Updated(existing.id));
        }

        let review = NewReview {
            product_id,
            author_name: user
                .as_ref()
                .map(|u| u.display_name.clone())
                .unwrap_or_else(|| author_name.to_string()),
            author_email: email,
            author_ip,
            content,
            rating,
            status: if self.settings.auto_approve_reviews {
                ModerationStatus::Approved
            } else {
                ModerationStatus::Pending
            },
            verified: self.settings.reviews_are_verified,
            user_id: user.as_ref().map_or(0, |u| u.id),
            created_at,
        };

        let review_id = self.reviews.insert(review).map_err(|e| {
            warn!("Row {}: inserting review failed: {}", row.row_number, e);
            ImportError::comment_insert_failed()
        })?;
        debug!("Row {}: created review {} on product {}", row.row_number, review_id, product_id);
        Ok(ImportOutcome::Created(review_id))
    }

    /// Existing account for `email`, or a new customer account when enabled.
    /// A failed account creation leaves the review as a guest review.
    fn resolve_user(&self, email: &str, author_name: &str) -> Result<Option<User>, ImportError> {
        if let Some(user) = self
            .users
            .find_by_email(email)
            .map_err(|e| ImportError::store("User lookup failed", &e))?
        {
            return Ok(Some(user));
        }
        if !self.settings.create_user_accounts {
            return Ok(None);
        }

        let new_user = match self.new_account(email, author_name) {
            Ok(new_user) => new_user,
            Err(e) => {
                warn!("Could not pick a username for {}: {}; importing as guest", email, e);
                return Ok(None);
            }
        };
        let username = new_user.username.clone();

        match self.users.create_user(new_user) {
            Ok(user) => {
                debug!("Created customer account {} (id {})", username, user.id);
                Ok(Some(user))
            }
            Err(e) => {
                warn!("Creating account {} failed: {}; importing as guest", username, e);
                Ok(None)
            }
        }
    }

    fn new_account(&self, email: &str, author_name: &str) -> Result<NewUser, crate::error::StoreError> {
        let mut rng = rand::thread_rng();
        let mut username = username_from_email(email);
        if self.users.username_exists(&username)? {
            username = format!("{}_{}", username, rng.gen_range(100..=999));
        }

        let password: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(GENERATED_PASSWORD_LENGTH)
            .map(char::from)
            .collect();

        Ok(NewUser {
            username,
            email: email.to_string(),
            password,
            display_name: author_name.to_string(),
            role: UserRole::Customer,
        })
    }

    /// Import each row independently, in order; failures are collected
    pub fn import_reviews(&self, rows: &[ImportRow]) -> BatchResult {
        let mut result = BatchResult::default();

        for (index, row) in rows.iter().enumerate() {
            match self.import_review(row) {
                Ok(ImportOutcome::Created(_)) => result.success_count += 1,
                Ok(ImportOutcome::Updated(_)) => result.updated_count += 1,
                Err(e) => {
                    warn!("Row {} skipped ({}): {}", row.row_number, e.code(), e);
                    result.errors.push(BatchRowError {
                        index,
                        row_number: row.row_number,
                        code: e.code(),
                        message: e.message,
                        row: row.clone(),
                    });
                }
            }
        }

        result
    }
}

/// A field already known to be present
fn required<'a>(row: &'a ImportRow, name: &str) -> &'a str {
    row.value(name).unwrap_or_default()
}

#[cfg(test)]
mod tests;
