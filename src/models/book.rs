//! Book (catalog entry) model and related types

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Catalog entry with its stock counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    /// Unique book code, e.g. `NOV-001`
    pub code: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    /// Physical copies owned by the library
    pub stock_total: u32,
    /// Copies currently on the shelf
    pub stock_available: u32,
}

impl Book {
    /// Copies currently out on loan
    pub fn borrowed(&self) -> u32 {
        self.stock_total.saturating_sub(self.stock_available)
    }

    /// Check `0 <= stock_available <= stock_total`
    pub fn check_stock(&self) -> AppResult<()> {
        if self.stock_available > self.stock_total {
            return Err(AppError::Validation(format!(
                "Available stock ({}) cannot exceed total stock ({}) for book {}",
                self.stock_available, self.stock_total, self.code
            )));
        }
        Ok(())
    }

    /// Case-insensitive match on title, code, author or publisher
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [&self.title, &self.code, &self.author, &self.publisher]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 32, message = "Book code must be 1 to 32 characters"))]
    pub code: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publisher: String,
    #[validate(range(min = 1000, max = 9999, message = "Year must have four digits"))]
    pub year: Option<i32>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub stock_total: u32,
    /// Defaults to `stock_total`
    pub stock_available: Option<u32>,
}

impl From<CreateBook> for Book {
    fn from(data: CreateBook) -> Self {
        Self {
            stock_available: data.stock_available.unwrap_or(data.stock_total),
            code: data.code.trim().to_string(),
            title: data.title.trim().to_string(),
            author: data.author.trim().to_string(),
            publisher: data.publisher.trim().to_string(),
            year: data.year,
            category: data.category,
            isbn: data.isbn,
            stock_total: data.stock_total,
        }
    }
}

/// Administrative edit of a catalog entry
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    #[validate(range(min = 1000, max = 9999, message = "Year must have four digits"))]
    pub year: Option<i32>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub stock_total: Option<u32>,
    pub stock_available: Option<u32>,
}

impl UpdateBook {
    /// Apply the provided fields on top of an existing record.
    ///
    /// A new `stock_total` keeps the copies already out on loan, so the shelf
    /// count moves by the same amount. An explicit `stock_available` is a
    /// manual correction and wins over that.
    pub fn apply_to(self, book: &mut Book) -> AppResult<()> {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(publisher) = self.publisher {
            book.publisher = publisher;
        }
        if self.year.is_some() {
            book.year = self.year;
        }
        if self.category.is_some() {
            book.category = self.category;
        }
        if self.isbn.is_some() {
            book.isbn = self.isbn;
        }
        if let Some(total) = self.stock_total {
            let borrowed = book.borrowed();
            if total < borrowed {
                return Err(AppError::Validation(format!(
                    "Book {} has {} copies on loan, total stock cannot drop to {}",
                    book.code, borrowed, total
                )));
            }
            book.stock_total = total;
            book.stock_available = total - borrowed;
        }
        if let Some(available) = self.stock_available {
            book.stock_available = available;
        }
        book.check_stock()
    }
}

/// Catalog search parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct BookQuery {
    /// Free text matched against title, code, author and publisher
    pub q: Option<String>,
    /// Exact category
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Book {
        Book {
            code: "NOV-001".to_string(),
            title: "Laskar Pelangi".to_string(),
            author: "Andrea Hirata".to_string(),
            publisher: "Bentang Pustaka".to_string(),
            year: Some(2005),
            category: Some("Novel".to_string()),
            isbn: None,
            stock_total: 5,
            stock_available: 3,
        }
    }

    #[test]
    fn test_borrowed_count() {
        assert_eq!(sample().borrowed(), 2);
    }

    #[test]
    fn test_check_stock() {
        let mut book = sample();
        assert!(book.check_stock().is_ok());
        book.stock_available = 6;
        assert!(matches!(book.check_stock(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_matches() {
        let book = sample();
        assert!(book.matches("laskar"));
        assert!(book.matches("nov-0"));
        assert!(book.matches("BENTANG"));
        assert!(book.matches("hirata"));
        assert!(book.matches("  "));
        assert!(!book.matches("bumi"));
    }

    #[test]
    fn test_create_defaults_available_to_total() {
        let book = Book::from(CreateBook {
            code: " NOV-009 ".to_string(),
            title: "Sang Pemimpi".to_string(),
            author: String::new(),
            publisher: String::new(),
            year: None,
            category: None,
            isbn: None,
            stock_total: 4,
            stock_available: None,
        });
        assert_eq!(book.code, "NOV-009");
        assert_eq!(book.stock_available, 4);
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let mut book = sample();
        UpdateBook {
            title: Some("Laskar Pelangi (edisi revisi)".to_string()),
            ..Default::default()
        }
        .apply_to(&mut book)
        .unwrap();
        assert_eq!(book.title, "Laskar Pelangi (edisi revisi)");
        assert_eq!((book.stock_total, book.stock_available), (5, 3));
        assert_eq!(book.author, "Andrea Hirata");
    }

    #[test]
    fn test_new_total_keeps_copies_on_loan() {
        let mut book = sample();
        UpdateBook {
            stock_total: Some(7),
            ..Default::default()
        }
        .apply_to(&mut book)
        .unwrap();
        assert_eq!(book.stock_total, 7);
        assert_eq!(book.stock_available, 5);
        assert_eq!(book.borrowed(), 2);

        let mut book = sample();
        let err = UpdateBook {
            stock_total: Some(1),
            ..Default::default()
        }
        .apply_to(&mut book)
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_manual_available_correction_is_bounded() {
        let mut book = sample();
        let err = UpdateBook {
            stock_available: Some(6),
            ..Default::default()
        }
        .apply_to(&mut book)
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
