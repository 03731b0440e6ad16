//! Student registry service

use crate::{
    error::{AppError, AppResult},
    models::borrower::{Borrower, BorrowerQuery, CreateBorrower, UpdateBorrower},
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowersService {
    repository: Repository,
}

impl BorrowersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrowers matching the query, by name
    pub async fn search_borrowers(&self, query: &BorrowerQuery) -> AppResult<Vec<Borrower>> {
        let text = query.q.as_deref().unwrap_or_default();
        Ok(self
            .repository
            .select_borrowers()
            .await?
            .into_iter()
            .filter(|borrower| borrower.matches(text))
            .collect())
    }

    pub async fn get_borrower(&self, id: &str) -> AppResult<Option<Borrower>> {
        self.repository.select_borrower(id).await
    }

    pub async fn register_borrower(&self, data: CreateBorrower) -> AppResult<Borrower> {
        let borrower = Borrower::from(data);
        if borrower.id.is_empty() || !borrower.id.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::Validation(format!(
                "Student number '{}' must be digits only",
                borrower.id
            )));
        }
        if borrower.name.is_empty() || borrower.class_name.is_empty() {
            return Err(AppError::Validation(format!(
                "Borrower {} needs a name and a class",
                borrower.id
            )));
        }

        let created = self.repository.insert_borrower(&borrower).await?;
        tracing::info!("Registered borrower {} ({})", created.id, created.class_name);
        Ok(created)
    }

    pub async fn update_borrower(&self, id: &str, data: UpdateBorrower) -> AppResult<Borrower> {
        let mut borrower = self
            .repository
            .select_borrower(id)
            .await?
            .ok_or_else(|| AppError::BorrowerNotFound(id.to_string()))?;

        data.apply_to(&mut borrower);
        self.repository.update_borrower(&borrower).await
    }

    /// Remove a borrower. Refused while they still hold unreturned books;
    /// returned loans keep the student number for history.
    pub async fn delete_borrower(&self, id: &str) -> AppResult<()> {
        if !self.repository.delete_borrower(id).await? {
            return Err(match self.repository.select_borrower(id).await? {
                None => AppError::BorrowerNotFound(id.to_string()),
                Some(_) => AppError::Conflict(format!(
                    "Borrower {} still holds unreturned books",
                    id
                )),
            });
        }
        tracing::info!("Deleted borrower {}", id);
        Ok(())
    }
}
