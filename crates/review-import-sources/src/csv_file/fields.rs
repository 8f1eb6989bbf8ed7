/// A CSV column the importer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Header text in the CSV file
    pub column: &'static str,
    /// Field name on `ImportRow`
    pub field: &'static str,
    /// Whether the header must be present for the file to be accepted
    pub required: bool,
    pub description: &'static str,
}

pub const FIELD_DEFINITIONS: [FieldDefinition; 7] = [
    FieldDefinition {
        column: "SKU",
        field: "product_sku",
        required: true,
        description: "Product SKU to attach the review to (variant SKUs attach to the parent product)",
    },
    FieldDefinition {
        column: "Author Name",
        field: "author_name",
        required: true,
        description: "Reviewer display name",
    },
    FieldDefinition {
        column: "Author Email",
        field: "author_email",
        required: false,
        description: "Reviewer email, used to match existing reviews and accounts (required on every row)",
    },
    FieldDefinition {
        column: "Author IP",
        field: "author_ip",
        required: false,
        description: "Reviewer IP address; the configured default is used when blank or invalid",
    },
    FieldDefinition {
        column: "Review Date",
        field: "review_date",
        required: false,
        description: "Review date in Y-m-d H:i:s TZ format; the import time is used when blank or unparseable",
    },
    FieldDefinition {
        column: "Review Text",
        field: "review_text",
        required: true,
        description: "Review body; line breaks are kept, other markup is removed",
    },
    FieldDefinition {
        column: "Review Stars",
        field: "review_stars",
        required: true,
        description: "Whole-number star rating from 1 to 5",
    },
];

pub const REQUIRED_COLUMNS: [&str; 4] = ["SKU", "Author Name", "Review Text", "Review Stars"];

pub fn field_for_column(column: &str) -> Option<&'static str> {
    FIELD_DEFINITIONS
        .iter()
        .find(|def| def.column == column)
        .map(|def| def.field)
}

const SAMPLE_CSV: &str = "\"SKU\",\"Author Name\",\"Author Email\",\"Author IP\",\"Review Date\",\"Review Text\",\"Review Stars\"
\"ABC123\",\"John Doe\",\"john@example.com\",\"192.168.1.10\",\"2024-01-15 10:30:00 UTC\",\"Great product, works exactly as described.\",\"5\"
\"ABC123-RED\",\"Jane Smith\",\"jane@example.com\",\"\",\"2024-02-03 18:05:00 UTC\",\"Nice colour.
Shipping was a little slow.\",\"4\"
";

/// A small file that passes validation, for users building their own export
pub fn sample_csv() -> &'static str {
    SAMPLE_CSV
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_columns_match_definitions() {
        let required: Vec<&str> = FIELD_DEFINITIONS
            .iter()
            .filter(|def| def.required)
            .map(|def| def.column)
            .collect();
        assert_eq!(required, REQUIRED_COLUMNS.to_vec());
    }

    #[test]
    fn test_field_for_column() {
        assert_eq!(field_for_column("Review Stars"), Some("review_stars"));
        assert_eq!(field_for_column("review stars"), None);
        assert_eq!(field_for_column("Color"), None);
    }
}
