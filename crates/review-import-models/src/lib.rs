pub mod import_row;
pub mod product;
pub mod review;
pub mod session;
pub mod user;

pub use import_row::ImportRow;
pub use product::Product;
pub use review::{ModerationStatus, NewReview, Review};
pub use session::{ImportProgress, RowError, UploadSession};
pub use user::{NewUser, User, UserRole};
