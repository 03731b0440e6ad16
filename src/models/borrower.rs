//! Borrower (student) model

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Registered student allowed to borrow books
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Borrower {
    /// National student number (NISN)
    pub id: String,
    pub name: String,
    /// Class or section, e.g. `7A`
    #[serde(rename = "class")]
    pub class_name: String,
}

impl Borrower {
    /// Case-insensitive match on name, student number or class
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self.id.contains(&query)
            || self.class_name.to_lowercase().contains(&query)
    }
}

/// Register borrower request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBorrower {
    #[validate(length(min = 1, max = 20, message = "Student number must be 1 to 20 characters"))]
    pub id: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(rename = "class")]
    #[validate(length(min = 1, max = 16, message = "Class must be 1 to 16 characters"))]
    pub class_name: String,
}

impl From<CreateBorrower> for Borrower {
    fn from(data: CreateBorrower) -> Self {
        Self {
            id: data.id.trim().to_string(),
            name: data.name.trim().to_string(),
            class_name: data.class_name.trim().to_uppercase(),
        }
    }
}

/// Update borrower request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBorrower {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[serde(rename = "class")]
    #[validate(length(min = 1, max = 16, message = "Class must be 1 to 16 characters"))]
    pub class_name: Option<String>,
}

impl UpdateBorrower {
    pub fn apply_to(self, borrower: &mut Borrower) {
        if let Some(name) = self.name {
            borrower.name = name.trim().to_string();
        }
        if let Some(class_name) = self.class_name {
            borrower.class_name = class_name.trim().to_uppercase();
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct BorrowerQuery {
    /// Free text matched against name, student number and class
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches() {
        let borrower = Borrower {
            id: "2024001".to_string(),
            name: "Ahmad Rizki Pratama".to_string(),
            class_name: "7A".to_string(),
        };
        assert!(borrower.matches("rizki"));
        assert!(borrower.matches("2024"));
        assert!(borrower.matches("7a"));
        assert!(!borrower.matches("siti"));
    }

    #[test]
    fn test_class_is_serialized_as_class() {
        let borrower = Borrower {
            id: "2024002".to_string(),
            name: "Siti Nurhaliza".to_string(),
            class_name: "7B".to_string(),
        };
        let json = serde_json::to_value(&borrower).unwrap();
        assert_eq!(json["class"], "7B");
    }
}
