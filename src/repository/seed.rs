//! Demo catalog, student registry and a handful of open loans

use chrono::{Days, NaiveDate};

use super::RecordStore;
use crate::{
    error::{AppError, AppResult},
    models::{Book, Borrower, NewLoan},
};

const BOOKS: &[(&str, &str, &str, &str, i32, &str, u32)] = &[
    ("NOV-001", "Laskar Pelangi", "Andrea Hirata", "Bentang Pustaka", 2005, "Novel", 5),
    ("NOV-002", "Bumi Manusia", "Pramoedya Ananta Toer", "Hasta Mitra", 1980, "Novel", 3),
    ("NOV-003", "Sang Pemimpi", "Andrea Hirata", "Bentang Pustaka", 2006, "Novel", 4),
    ("PLJ-001", "Matematika Kelas 7", "Tim Kemendikbud", "Kemendikbud", 2023, "Pelajaran", 20),
    ("PLJ-002", "IPA Terpadu Kelas 8", "Tim Kemendikbud", "Kemendikbud", 2023, "Pelajaran", 18),
    ("PLJ-003", "Bahasa Indonesia Kelas 9", "Tim Kemendikbud", "Kemendikbud", 2023, "Pelajaran", 25),
    ("PLJ-004", "Sejarah Indonesia", "Tim Kemendikbud", "Kemendikbud", 2023, "Pelajaran", 15),
    ("REF-001", "Ensiklopedia Anak Pintar", "Tim Gramedia", "Gramedia", 2020, "Referensi", 2),
];

const BORROWERS: &[(&str, &str, &str)] = &[
    ("2024001", "Ahmad Rizki Pratama", "7A"),
    ("2024002", "Siti Nurhaliza", "7B"),
    ("2023003", "Budi Santoso", "8A"),
    ("2023004", "Dewi Anggraini", "8B"),
    ("2022005", "Eka Putri Rahayu", "9A"),
    ("2022006", "Fajar Nugroho", "9B"),
];

/// (borrower, book, days ago)
const LOANS: &[(&str, &str, u64)] = &[
    ("2024001", "NOV-001", 10),
    ("2024002", "PLJ-001", 8),
    ("2023003", "NOV-002", 20),
    ("2023004", "PLJ-002", 5),
    ("2022005", "PLJ-003", 12),
];

/// Load the demo data into an empty store. Does nothing if books already exist.
pub async fn seed_demo_data(
    store: &dyn RecordStore,
    today: NaiveDate,
    duration_days: u32,
) -> AppResult<()> {
    if !store.select_books().await?.is_empty() {
        tracing::debug!("Store already holds books, skipping demo data");
        return Ok(());
    }

    for &(code, title, author, publisher, year, category, stock) in BOOKS {
        store
            .insert_book(&Book {
                code: code.to_string(),
                title: title.to_string(),
                author: author.to_string(),
                publisher: publisher.to_string(),
                year: Some(year),
                category: Some(category.to_string()),
                isbn: None,
                stock_total: stock,
                stock_available: stock,
            })
            .await?;
    }

    for &(id, name, class_name) in BORROWERS {
        store
            .insert_borrower(&Borrower {
                id: id.to_string(),
                name: name.to_string(),
                class_name: class_name.to_string(),
            })
            .await?;
    }

    for &(borrower_id, book_code, days_ago) in LOANS {
        let borrow_date = today
            .checked_sub_days(Days::new(days_ago))
            .ok_or_else(|| AppError::Internal("Demo loan date out of range".to_string()))?;
        if !store.take_copy(book_code).await? {
            return Err(AppError::OutOfStock(book_code.to_string()));
        }
        let loan = NewLoan::starting(borrower_id, book_code, borrow_date, duration_days)?;
        store.insert_loan(&loan).await?;
    }

    tracing::info!(
        "Loaded demo data: {} books, {} borrowers, {} loans",
        BOOKS.len(),
        BORROWERS.len(),
        LOANS.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    #[tokio::test]
    async fn test_seeded_stock_matches_open_loans() {
        let store = MemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        seed_demo_data(&store, today, 14).await.unwrap();

        let books = store.select_books().await.unwrap();
        let loans = store.select_loans().await.unwrap();
        for book in &books {
            let open = loans.iter().filter(|l| l.book_code == book.code).count() as u32;
            assert_eq!(book.stock_available + open, book.stock_total, "{}", book.code);
        }

        // one of the demo loans is already past its due date
        assert_eq!(loans.iter().filter(|l| l.is_overdue(today)).count(), 1);
    }

    #[tokio::test]
    async fn test_seeding_twice_is_a_no_op() {
        let store = MemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        seed_demo_data(&store, today, 14).await.unwrap();
        seed_demo_data(&store, today, 14).await.unwrap();
        assert_eq!(store.select_loans().await.unwrap().len(), LOANS.len());
    }
}
