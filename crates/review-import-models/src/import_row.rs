use serde::{Deserialize, Serialize};

/// One normalized CSV data line, ready for the importer.
///
/// Every field is optional because a column may be absent from the file or
/// left blank; the importer decides which ones are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_stars: Option<String>,
    /// 1-based line number in the file (the header is line 1)
    pub row_number: usize,
}

impl ImportRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            ..Self::default()
        }
    }

    /// Value of a field, with blank strings treated the same as missing ones
    pub fn value(&self, field: &str) -> Option<&str> {
        let value = match field {
            "product_sku" => self.product_sku.as_deref(),
            "author_name" => self.author_name.as_deref(),
            "author_email" => self.author_email.as_deref(),
            "author_ip" => self.author_ip.as_deref(),
            "review_date" => self.review_date.as_deref(),
            "review_text" => self.review_text.as_deref(),
            "review_stars" => self.review_stars.as_deref(),
            _ => None,
        };
        value.filter(|v| !v.is_empty())
    }

    /// Set a field by its canonical name. Unknown names are ignored.
    pub fn set(&mut self, field: &str, value: String) {
        let slot = match field {
            "product_sku" => &mut self.product_sku,
            "author_name" => &mut self.author_name,
            "author_email" => &mut self.author_email,
            "author_ip" => &mut self.author_ip,
            "review_date" => &mut self.review_date,
            "review_text" => &mut self.review_text,
            "review_stars" => &mut self.review_stars,
            _ => return,
        };
        *slot = Some(value);
    }
}
