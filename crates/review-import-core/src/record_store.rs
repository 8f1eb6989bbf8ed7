use crate::error::StoreError;
use crate::repository::{ProductRepository, ReviewRepository, UserRepository};
use review_import_models::{NewReview, NewUser, Product, Review, User};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    reviews: Vec<Review>,
}

impl StoreData {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Products, users and reviews kept in a single JSON document.
///
/// Stands in for the storefront's own database when the importer runs from
/// the command line. Every mutation is written back immediately when the
/// store has a backing file. Passwords handed to `create_user` are not kept.
pub struct RecordStore {
    path: Option<PathBuf>,
    data: Mutex<StoreData>,
}

impl RecordStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Mutex::new(StoreData::default()),
        }
    }

    /// Open the store file, starting empty if it does not exist yet
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let data = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let data: StoreData = serde_json::from_str(&content)?;
            info!(
                "Loaded record store: {} products, {} users, {} reviews",
                data.products.len(),
                data.users.len(),
                data.reviews.len()
            );
            data
        } else {
            debug!("Record store {:?} does not exist, starting empty", path);
            StoreData::default()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            data: Mutex::new(data),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreData>, StoreError> {
        self.data
            .lock()
            .map_err(|_| StoreError::Rejected("record store lock poisoned".to_string()))
    }

    fn persist(&self, data: &StoreData) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, serde_json::to_string_pretty(data)?)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Add a product; with `parent_sku` it becomes a variant of that product
    pub fn add_product(&self, sku: &str, name: &str, parent_sku: Option<&str>) -> Result<Product, StoreError> {
        let sku = sku.trim();
        if sku.is_empty() {
            return Err(StoreError::Rejected("SKU must not be empty".to_string()));
        }

        let mut data = self.lock()?;
        if data.products.iter().any(|p| p.sku == sku) {
            return Err(StoreError::Rejected(format!("SKU already exists: {}", sku)));
        }

        let parent_id = match parent_sku {
            Some(parent_sku) => {
                let parent = data
                    .products
                    .iter()
                    .find(|p| p.sku == parent_sku)
                    .ok_or_else(|| StoreError::Rejected(format!("Parent product not found: {}", parent_sku)))?;
                if parent.is_variant() {
                    return Err(StoreError::Rejected(format!(
                        "{} is a variant and cannot have variants",
                        parent_sku
                    )));
                }
                Some(parent.id)
            }
            None => None,
        };

        let product = Product {
            id: data.allocate_id(),
            sku: sku.to_string(),
            name: name.to_string(),
            parent_id,
        };
        data.products.push(product.clone());
        self.persist(&data)?;

        info!("Added product {} (id {})", product.sku, product.id);
        Ok(product)
    }

    pub fn products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.lock()?.products.clone())
    }

    pub fn users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.lock()?.users.clone())
    }

    pub fn reviews(&self) -> Result<Vec<Review>, StoreError> {
        Ok(self.lock()?.reviews.clone())
    }

    pub fn reviews_for_product(&self, product_id: u64) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .lock()?
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect())
    }
}

impl ProductRepository for RecordStore {
    fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.lock()?.products.iter().find(|p| p.sku == sku).cloned())
    }
}

impl UserRepository for RecordStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self
            .lock()?
            .users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(username)))
    }

    fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut data = self.lock()?;
        if user.username.is_empty() {
            return Err(StoreError::Rejected("Cannot create a user with an empty login name.".to_string()));
        }
        if data.users.iter().any(|u| u.username.eq_ignore_ascii_case(&user.username)) {
            return Err(StoreError::Rejected("Sorry, that username already exists!".to_string()));
        }
        if data.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Rejected("Sorry, that email address is already used!".to_string()));
        }

        let created = User {
            id: data.allocate_id(),
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
        };
        data.users.push(created.clone());
        self.persist(&data)?;
        Ok(created)
    }
}

impl ReviewRepository for RecordStore {
    fn find_by_product_and_email(&self, product_id: u64, email: &str) -> Result<Option<Review>, StoreError> {
        Ok(self
            .lock()?
            .reviews
            .iter()
            .find(|r| r.product_id == product_id && r.author_email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn insert(&self, review: NewReview) -> Result<u64, StoreError> {
        let mut data = self.lock()?;
        if !data.products.iter().any(|p| p.id == review.product_id) {
            return Err(StoreError::Rejected(format!("No product with id {}", review.product_id)));
        }

        let id = data.allocate_id();
        data.reviews.push(review.into_review(id));
        self.persist(&data)?;
        Ok(id)
    }

    fn update_content(&self, review_id: u64, content: &str, rating: u8) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        let Some(review) = data.reviews.iter_mut().find(|r| r.id == review_id) else {
            warn!("Review {} vanished before it could be updated", review_id);
            return Err(StoreError::Rejected(format!("No review with id {}", review_id)));
        };
        review.content = content.to_string();
        review.rating = rating;
        self.persist(&data)?;
        Ok(())
    }
}
