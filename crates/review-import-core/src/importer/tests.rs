use super::*;
use crate::error::{ImportErrorKind, StoreError};
use crate::record_store::RecordStore;
use chrono::{NaiveDate, NaiveDateTime};
use review_import_models::Review;
use tempfile::TempDir;

fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 18)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap()
}

struct Fixture {
    _dir: TempDir,
    context: ImportContext,
    store: Arc<RecordStore>,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let (context, store) = ImportContext::in_memory(dir.path());
        store.add_product("ABC123", "Widget", None).unwrap();
        store.add_product("ABC123-RED", "Widget (red)", Some("ABC123")).unwrap();
        Self {
            _dir: dir,
            context: context.with_clock(fixed_now),
            store,
        }
    }

    fn with_settings(mut self, settings: ImportSettings) -> Self {
        self.context = self.context.with_settings(settings);
        self
    }

    fn importer(&self) -> ReviewImporter {
        ReviewImporter::new(&self.context)
    }

    fn product_id(&self, sku: &str) -> u64 {
        self.store.find_by_sku(sku).unwrap().unwrap().id
    }

    fn reviews(&self) -> Vec<Review> {
        self.store.reviews().unwrap()
    }
}

fn row(row_number: usize, sku: &str, email: &str, text: &str, stars: &str) -> ImportRow {
    ImportRow {
        product_sku: Some(sku.to_string()),
        author_name: Some("John Doe".to_string()),
        author_email: Some(email.to_string()),
        review_text: Some(text.to_string()),
        review_stars: Some(stars.to_string()),
        ..ImportRow::new(row_number)
    }
}

#[test]
fn test_creates_review_for_new_reviewer() {
    let fixture = Fixture::new();
    let outcome = fixture
        .importer()
        .import_review(&row(2, "ABC123", "john@example.com", "Great product works well", "5"))
        .unwrap();

    let reviews = fixture.reviews();
    assert_eq!(reviews.len(), 1);
    let review = &reviews[0];
    assert_eq!(outcome, ImportOutcome::Created(review.id));
    assert_eq!(review.product_id, fixture.product_id("ABC123"));
    assert_eq!(review.author_name, "John Doe");
    assert_eq!(review.author_email, "john@example.com");
    assert_eq!(review.author_ip, "127.0.0.1");
    assert_eq!(review.content, "Great product works well");
    assert_eq!(review.rating, 5);
    assert_eq!(review.status, ModerationStatus::Approved);
    assert!(!review.verified);
    assert_eq!(review.user_id, 0);
    assert_eq!(review.created_at, fixed_now());
}

#[test]
fn test_optional_fields_and_settings_flow_into_review() {
    let fixture = Fixture::new().with_settings(ImportSettings {
        auto_approve_reviews: false,
        reviews_are_verified: true,
        default_ip_address: "10.0.0.7".to_string(),
        ..ImportSettings::default()
    });

    let mut with_ip = row(2, "ABC123", "john@example.com", "Line one\nLine two <b>bold</b>", "4");
    with_ip.author_ip = Some("192.168.1.10".to_string());
    with_ip.review_date = Some("2024-01-15 10:30:00 UTC".to_string());
    let mut bad_ip = row(3, "ABC123", "jane@example.com", "Solid and well built", "3");
    bad_ip.author_ip = Some("not-an-ip".to_string());
    bad_ip.review_date = Some("sometime last year".to_string());

    let importer = fixture.importer();
    importer.import_review(&with_ip).unwrap();
    importer.import_review(&bad_ip).unwrap();

    let reviews = fixture.reviews();
    assert_eq!(reviews[0].status, ModerationStatus::Pending);
    assert!(reviews[0].verified);
    assert_eq!(reviews[0].author_ip, "192.168.1.10");
    assert_eq!(reviews[0].content, "Line one<br />\nLine two bold");
    assert_eq!(
        reviews[0].created_at,
        NaiveDate::from_ymd_opt(2024, 1, 15).and_then(|d| d.and_hms_opt(10, 30, 0)).unwrap()
    );
    assert_eq!(reviews[1].author_ip, "10.0.0.7");
    assert_eq!(reviews[1].created_at, fixed_now());
}

#[test]
fn test_second_row_for_same_reviewer_updates_text_and_rating_only() {
    let fixture = Fixture::new();
    let importer = fixture.importer();

    let mut first = row(2, "ABC123", "john@example.com", "Great product works well", "5");
    first.review_date = Some("2024-01-15 10:30:00".to_string());
    let created = importer.import_review(&first).unwrap();

    let mut second = row(3, "ABC123", "JOHN@example.com", "Broke after a week of use", "2");
    second.author_name = Some("Somebody Else".to_string());
    let updated = importer.import_review(&second).unwrap();

    assert_eq!(updated, ImportOutcome::Updated(created.review_id()));
    let reviews = fixture.reviews();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].content, "Broke after a week of use");
    assert_eq!(reviews[0].rating, 2);
    assert_eq!(reviews[0].author_name, "John Doe");
    assert_eq!(reviews[0].status, ModerationStatus::Approved);
    assert_eq!(
        reviews[0].created_at,
        NaiveDate::from_ymd_opt(2024, 1, 15).and_then(|d| d.and_hms_opt(10, 30, 0)).unwrap()
    );
}

#[test]
fn test_reimport_is_idempotent() {
    let fixture = Fixture::new();
    let importer = fixture.importer();
    let input = row(2, "ABC123", "john@example.com", "Great product works well", "5");

    importer.import_review(&input).unwrap();
    importer.import_review(&input).unwrap();
    importer.import_review(&input).unwrap();

    let reviews = fixture.reviews();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].content, "Great product works well");
    assert_eq!(reviews[0].rating, 5);
}

#[test]
fn test_duplicate_detection_ignores_moderation_status() {
    let fixture = Fixture::new().with_settings(ImportSettings {
        auto_approve_reviews: false,
        ..ImportSettings::default()
    });
    let importer = fixture.importer();

    importer
        .import_review(&row(2, "ABC123", "john@example.com", "Pending review text", "3"))
        .unwrap();
    let outcome = importer
        .import_review(&row(3, "ABC123", "john@example.com", "Replacement review text", "4"))
        .unwrap();

    assert!(matches!(outcome, ImportOutcome::Updated(_)));
    assert_eq!(fixture.reviews().len(), 1);
}

#[test]
fn test_invalid_ratings_create_nothing() {
    let fixture = Fixture::new();
    let importer = fixture.importer();

    for stars in ["0", "6", "abc", "-9"] {
        let err = importer
            .import_review(&row(2, "ABC123", "john@example.com", "Great product works well", stars))
            .unwrap_err();
        assert_eq!(err.kind, ImportErrorKind::InvalidRating, "stars = {}", stars);
        assert_eq!(err.message, "Star rating must be 1-5");
    }
    assert!(fixture.reviews().is_empty());
}

#[test]
fn test_unknown_sku() {
    let fixture = Fixture::new();
    let err = fixture
        .importer()
        .import_review(&row(2, "NOPE", "john@example.com", "Great product works well", "5"))
        .unwrap_err();

    assert_eq!(err.code(), "product_not_found");
    assert_eq!(err.message, "Product not found: NOPE");
}

#[test]
fn test_variant_sku_attaches_to_parent() {
    let fixture = Fixture::new();
    fixture
        .importer()
        .import_review(&row(2, "ABC123-RED", "john@example.com", "Lovely shade of red", "4"))
        .unwrap();

    let review = &fixture.reviews()[0];
    assert_eq!(review.product_id, fixture.product_id("ABC123"));
    assert_ne!(review.product_id, fixture.product_id("ABC123-RED"));
}

#[test]
fn test_missing_fields_are_reported_in_order() {
    let fixture = Fixture::new();
    let importer = fixture.importer();

    let empty = ImportRow::new(2);
    assert_eq!(
        importer.import_review(&empty).unwrap_err().message,
        "Missing required field: product_sku"
    );

    let mut no_email = row(3, "ABC123", "", "Great product works well", "5");
    no_email.author_email = Some(String::new());
    let err = importer.import_review(&no_email).unwrap_err();
    assert_eq!(err.kind, ImportErrorKind::MissingField);
    assert_eq!(err.message, "Missing required field: author_email");

    let mut no_stars = row(4, "ABC123", "john@example.com", "Great product works well", "5");
    no_stars.review_stars = None;
    assert_eq!(
        importer.import_review(&no_stars).unwrap_err().message,
        "Missing required field: review_stars"
    );
}

#[test]
fn test_invalid_email() {
    let fixture = Fixture::new();
    let err = fixture
        .importer()
        .import_review(&row(2, "ABC123", "john at example", "Great product works well", "5"))
        .unwrap_err();

    assert_eq!(err.code(), "invalid_email");
    assert_eq!(err.message, "Invalid email: john at example");
}

#[test]
fn test_review_too_short_uses_configured_minimum() {
    let fixture = Fixture::new().with_settings(ImportSettings {
        min_review_length: 30,
        ..ImportSettings::default()
    });
    let err = fixture
        .importer()
        .import_review(&row(2, "ABC123", "john@example.com", "Great product works well", "5"))
        .unwrap_err();

    assert_eq!(err.code(), "review_too_short");
    assert_eq!(err.message, "Review text too short (minimum 30 characters)");
}

#[test]
fn test_markup_only_text_is_too_short() {
    let fixture = Fixture::new();
    let err = fixture
        .importer()
        .import_review(&row(2, "ABC123", "john@example.com", "<b><i>ok</i></b>", "5"))
        .unwrap_err();
    assert_eq!(err.kind, ImportErrorKind::ReviewTooShort);
}

#[test]
fn test_existing_account_is_linked() {
    let fixture = Fixture::new();
    let user = fixture
        .store
        .create_user(NewUser {
            username: "jdoe".to_string(),
            email: "john@example.com".to_string(),
            password: String::new(),
            display_name: "Johnny D".to_string(),
            role: UserRole::Customer,
        })
        .unwrap();

    fixture
        .importer()
        .import_review(&row(2, "ABC123", "john@example.com", "Great product works well", "5"))
        .unwrap();

    let review = &fixture.reviews()[0];
    assert_eq!(review.user_id, user.id);
    assert_eq!(review.author_name, "Johnny D");
}

#[test]
fn test_accounts_created_when_enabled() {
    let fixture = Fixture::new().with_settings(ImportSettings {
        create_user_accounts: true,
        ..ImportSettings::default()
    });
    fixture
        .store
        .create_user(NewUser {
            username: "john".to_string(),
            email: "someone-else@example.com".to_string(),
            password: String::new(),
            display_name: "Other John".to_string(),
            role: UserRole::Customer,
        })
        .unwrap();

    fixture
        .importer()
        .import_review(&row(2, "ABC123", "john@example.com", "Great product works well", "5"))
        .unwrap();

    let created = fixture.store.find_by_email("john@example.com").unwrap().unwrap();
    assert!(created.username.starts_with("john_"));
    assert_eq!(created.username.len(), "john_".len() + 3);
    assert_eq!(created.display_name, "John Doe");
    assert_eq!(created.role, UserRole::Customer);

    let review = &fixture.reviews()[0];
    assert_eq!(review.user_id, created.id);
}

#[test]
fn test_account_creation_failure_falls_back_to_guest() {
    let fixture = Fixture::new().with_settings(ImportSettings {
        create_user_accounts: true,
        ..ImportSettings::default()
    });

    // local part sanitizes to an empty username, which the store refuses
    fixture
        .importer()
        .import_review(&row(2, "ABC123", "+++@example.com", "Great product works well", "5"))
        .unwrap();

    assert!(fixture.store.users().unwrap().is_empty());
    assert_eq!(fixture.reviews()[0].user_id, 0);
    assert_eq!(fixture.reviews()[0].author_name, "John Doe");
}

#[test]
fn test_no_accounts_when_disabled() {
    let fixture = Fixture::new();
    fixture
        .importer()
        .import_review(&row(2, "ABC123", "john@example.com", "Great product works well", "5"))
        .unwrap();
    assert!(fixture.store.users().unwrap().is_empty());
}

/// Review repository that can find but never write
struct ReadOnlyReviews(Arc<RecordStore>);

impl ReviewRepository for ReadOnlyReviews {
    fn find_by_product_and_email(&self, product_id: u64, email: &str) -> Result<Option<Review>, StoreError> {
        self.0.find_by_product_and_email(product_id, email)
    }

    fn insert(&self, _review: NewReview) -> Result<u64, StoreError> {
        Err(StoreError::Rejected("read-only".to_string()))
    }

    fn update_content(&self, _review_id: u64, _content: &str, _rating: u8) -> Result<(), StoreError> {
        Err(StoreError::Rejected("read-only".to_string()))
    }
}

#[test]
fn test_store_write_failures() {
    let mut fixture = Fixture::new();
    let input = row(2, "ABC123", "john@example.com", "Great product works well", "5");
    fixture.importer().import_review(&input).unwrap();
    let existing_id = fixture.reviews()[0].id;

    fixture.context.reviews = Arc::new(ReadOnlyReviews(fixture.store.clone()));
    let importer = fixture.importer();

    let err = importer.import_review(&input).unwrap_err();
    assert_eq!(err, ImportError::review_update_failed(existing_id));

    let err = importer
        .import_review(&row(3, "ABC123", "jane@example.com", "Great product works well", "5"))
        .unwrap_err();
    assert_eq!(err.code(), "comment_insert_failed");
    assert_eq!(err.message, "Failed to create review");
}

#[test]
fn test_batch_counts_and_isolated_failures() {
    let fixture = Fixture::new();
    let importer = fixture.importer();
    importer
        .import_review(&row(1, "ABC123", "existing@example.com", "Already here before import", "3"))
        .unwrap();

    let rows = vec![
        row(2, "ABC123", "john@example.com", "Great product works well", "5"),
        row(3, "NOPE", "jane@example.com", "Great product works well", "5"),
        row(4, "ABC123", "existing@example.com", "Updated opinion after a month", "4"),
        row(5, "ABC123", "mary@example.com", "Great product works well", "9"),
        row(6, "ABC123-RED", "mary@example.com", "Lovely shade of red", "5"),
    ];
    let result = importer.import_reviews(&rows);

    assert_eq!(result.success_count, 2);
    assert_eq!(result.updated_count, 1);
    assert_eq!(result.errors.len(), 2);

    assert_eq!(result.errors[0].index, 1);
    assert_eq!(result.errors[0].row_number, 3);
    assert_eq!(result.errors[0].code, "product_not_found");
    assert_eq!(result.errors[0].row, rows[1]);

    assert_eq!(result.errors[1].index, 3);
    assert_eq!(result.errors[1].row_number, 5);
    assert_eq!(result.errors[1].code, "invalid_rating");

    assert_eq!(fixture.reviews().len(), 3);
}

#[test]
fn test_batch_counts_first_insert_as_created() {
    let fixture = Fixture::new();
    let result = fixture.importer().import_reviews(&[
        row(2, "ABC123", "john@example.com", "Great product works well", "5"),
        row(3, "ABC123", "john@example.com", "Second thoughts on this one", "3"),
    ]);

    assert_eq!(result.success_count, 1);
    assert_eq!(result.updated_count, 1);
    assert!(result.errors.is_empty());
}
