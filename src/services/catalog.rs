//! Catalog management service

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search the catalog by free text and category
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let text = query.q.as_deref().unwrap_or_default();
        let category = query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));

        Ok(self
            .repository
            .select_books()
            .await?
            .into_iter()
            .filter(|book| book.matches(text))
            .filter(|book| match category {
                Some(category) => book.category.as_deref() == Some(category),
                None => true,
            })
            .collect())
    }

    /// Distinct categories in catalog order
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let mut categories: Vec<String> = Vec::new();
        for book in self.repository.select_books().await? {
            if let Some(category) = book.category {
                if !categories.contains(&category) {
                    categories.push(category);
                }
            }
        }
        Ok(categories)
    }

    pub async fn get_book(&self, code: &str) -> AppResult<Option<Book>> {
        self.repository.select_book(code).await
    }

    /// Add a new title to the catalog
    pub async fn add_book(&self, data: CreateBook) -> AppResult<Book> {
        let book = Book::from(data);
        if book.code.is_empty() {
            return Err(AppError::Validation("Book code cannot be blank".to_string()));
        }
        if book.title.is_empty() {
            return Err(AppError::Validation(format!("Book {} needs a title", book.code)));
        }
        book.check_stock()?;

        let created = self.repository.insert_book(&book).await?;
        tracing::info!(
            "Catalog: added book {} ({} copies)",
            created.code,
            created.stock_total
        );
        Ok(created)
    }

    /// Administrative edit, stock counters included.
    ///
    /// Descriptive fields are written without touching the counters. New
    /// counters are only written if no borrow or return moved them since
    /// they were read; otherwise the edit fails with `Conflict`.
    pub async fn update_book(&self, code: &str, data: UpdateBook) -> AppResult<Book> {
        let current = self
            .repository
            .select_book(code)
            .await?
            .ok_or_else(|| AppError::BookNotFound(code.to_string()))?;

        let mut book = current.clone();
        data.apply_to(&mut book)?;

        let restocked = book.stock_total != current.stock_total
            || book.stock_available != current.stock_available;
        if restocked {
            let written = self
                .repository
                .update_book_stock(&current, book.stock_total, book.stock_available)
                .await?;
            if !written {
                return Err(self.missing_or(code, "its stock changed during the edit, retry").await?);
            }
            tracing::info!(
                "Catalog: book {} stock set to {}/{}",
                code,
                book.stock_available,
                book.stock_total
            );
        }

        self.repository.update_book_details(&book).await
    }

    /// Remove a title. Refused while any copy is still out on loan.
    pub async fn delete_book(&self, code: &str) -> AppResult<()> {
        if !self.repository.delete_book(code).await? {
            return Err(self.missing_or(code, "it has unreturned loans").await?);
        }
        tracing::info!("Catalog: deleted book {}", code);
        Ok(())
    }

    /// Error for a refused conditional write: gone, or still there but busy
    async fn missing_or(&self, code: &str, reason: &str) -> AppResult<AppError> {
        Ok(match self.repository.select_book(code).await? {
            None => AppError::BookNotFound(code.to_string()),
            Some(_) => AppError::Conflict(format!("Book {} not changed: {}", code, reason)),
        })
    }
}
