//! PostgreSQL record store

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{
    rows::{status_to_column, BookRow, BorrowerRow, LoanRow},
    RecordStore,
};
use crate::{
    error::{AppError, AppResult},
    models::{Book, Borrower, Loan, NewLoan},
};

const BOOK_COLUMNS: &str = "kode_buku, judul, penulis, penerbit, tahun_terbit, kategori, isbn, stok_total, stok_tersedia";
const LOAN_COLUMNS: &str = "id, nisn, kode_buku, tanggal_pinjam, jatuh_tempo, tanggal_kembali, status";

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Translate unique violations into `Duplicate`, everything else into `Persistence`
fn insert_error(e: sqlx::Error, what: String) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Duplicate(format!("{} already exists", what))
        }
        _ => e.into(),
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn select_books(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {} FROM buku ORDER BY kode_buku",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Book::try_from).collect()
    }

    async fn select_book(&self, code: &str) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {} FROM buku WHERE kode_buku = $1",
            BOOK_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?
        .map(Book::try_from)
        .transpose()
    }

    async fn insert_book(&self, book: &Book) -> AppResult<Book> {
        let row = BookRow::try_from(book)?;
        let inserted = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            INSERT INTO buku ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            BOOK_COLUMNS, BOOK_COLUMNS
        ))
        .bind(&row.kode_buku)
        .bind(&row.judul)
        .bind(&row.penulis)
        .bind(&row.penerbit)
        .bind(row.tahun_terbit)
        .bind(&row.kategori)
        .bind(&row.isbn)
        .bind(row.stok_total)
        .bind(row.stok_tersedia)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, format!("Book {}", book.code)))?;

        Book::try_from(inserted)
    }

    async fn update_book_details(&self, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, BookRow>(&format!(
            r#"
            UPDATE buku
            SET judul = $2, penulis = $3, penerbit = $4, tahun_terbit = $5,
                kategori = $6, isbn = $7
            WHERE kode_buku = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.code)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(book.year)
        .bind(&book.category)
        .bind(&book.isbn)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::BookNotFound(book.code.clone()))
        .and_then(Book::try_from)
    }

    async fn update_book_stock(
        &self,
        current: &Book,
        stock_total: u32,
        stock_available: u32,
    ) -> AppResult<bool> {
        let seen = BookRow::try_from(current)?;
        let wanted = BookRow::try_from(&Book {
            stock_total,
            stock_available,
            ..current.clone()
        })?;

        let result = sqlx::query(
            r#"
            UPDATE buku SET stok_total = $2, stok_tersedia = $3
            WHERE kode_buku = $1 AND stok_total = $4 AND stok_tersedia = $5
            "#,
        )
        .bind(&seen.kode_buku)
        .bind(wanted.stok_total)
        .bind(wanted.stok_tersedia)
        .bind(seen.stok_total)
        .bind(seen.stok_tersedia)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_book(&self, code: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM buku
            WHERE kode_buku = $1
              AND NOT EXISTS (
                  SELECT 1 FROM peminjaman
                  WHERE kode_buku = $1 AND tanggal_kembali IS NULL
              )
            "#,
        )
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn take_copy(&self, code: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE buku SET stok_tersedia = stok_tersedia - 1 WHERE kode_buku = $1 AND stok_tersedia > 0",
        )
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn restore_copy(&self, code: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE buku SET stok_tersedia = LEAST(stok_tersedia + 1, stok_total) WHERE kode_buku = $1",
        )
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn select_borrowers(&self) -> AppResult<Vec<Borrower>> {
        let rows = sqlx::query_as::<_, BorrowerRow>(
            "SELECT nisn, nama_siswa, kelas FROM siswa ORDER BY nama_siswa",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Borrower::from).collect())
    }

    async fn select_borrower(&self, id: &str) -> AppResult<Option<Borrower>> {
        let row = sqlx::query_as::<_, BorrowerRow>(
            "SELECT nisn, nama_siswa, kelas FROM siswa WHERE nisn = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Borrower::from))
    }

    async fn insert_borrower(&self, borrower: &Borrower) -> AppResult<Borrower> {
        let row = BorrowerRow::from(borrower);
        let inserted = sqlx::query_as::<_, BorrowerRow>(
            r#"
            INSERT INTO siswa (nisn, nama_siswa, kelas)
            VALUES ($1, $2, $3)
            RETURNING nisn, nama_siswa, kelas
            "#,
        )
        .bind(&row.nisn)
        .bind(&row.nama_siswa)
        .bind(&row.kelas)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, format!("Borrower {}", borrower.id)))?;

        Ok(inserted.into())
    }

    async fn update_borrower(&self, borrower: &Borrower) -> AppResult<Borrower> {
        let row = BorrowerRow::from(borrower);
        sqlx::query_as::<_, BorrowerRow>(
            r#"
            UPDATE siswa SET nama_siswa = $2, kelas = $3
            WHERE nisn = $1
            RETURNING nisn, nama_siswa, kelas
            "#,
        )
        .bind(&row.nisn)
        .bind(&row.nama_siswa)
        .bind(&row.kelas)
        .fetch_optional(&self.pool)
        .await?
        .map(Borrower::from)
        .ok_or_else(|| AppError::BorrowerNotFound(borrower.id.clone()))
    }

    async fn delete_borrower(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM siswa
            WHERE nisn = $1
              AND NOT EXISTS (
                  SELECT 1 FROM peminjaman
                  WHERE nisn = $1 AND tanggal_kembali IS NULL
              )
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn select_loans(&self) -> AppResult<Vec<Loan>> {
        let rows = sqlx::query_as::<_, LoanRow>(&format!(
            "SELECT {} FROM peminjaman ORDER BY id",
            LOAN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Loan::from).collect())
    }

    async fn select_loan(&self, id: i64) -> AppResult<Option<Loan>> {
        let row = sqlx::query_as::<_, LoanRow>(&format!(
            "SELECT {} FROM peminjaman WHERE id = $1",
            LOAN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Loan::from))
    }

    async fn insert_loan(&self, loan: &NewLoan) -> AppResult<Loan> {
        let row = sqlx::query_as::<_, LoanRow>(&format!(
            r#"
            INSERT INTO peminjaman (nisn, kode_buku, tanggal_pinjam, jatuh_tempo, status)
            VALUES ($1, $2, $3, $4, 'active')
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(&loan.borrower_id)
        .bind(&loan.book_code)
        .bind(loan.borrow_date)
        .bind(loan.due_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_loan(&self, loan: &Loan) -> AppResult<Loan> {
        sqlx::query_as::<_, LoanRow>(&format!(
            r#"
            UPDATE peminjaman
            SET nisn = $2, kode_buku = $3, tanggal_pinjam = $4, jatuh_tempo = $5,
                tanggal_kembali = $6, status = $7
            WHERE id = $1
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(loan.id)
        .bind(&loan.borrower_id)
        .bind(&loan.book_code)
        .bind(loan.borrow_date)
        .bind(loan.due_date)
        .bind(loan.return_date)
        .bind(status_to_column(loan.status))
        .fetch_optional(&self.pool)
        .await?
        .map(Loan::from)
        .ok_or(AppError::LoanNotFound(loan.id))
    }

    async fn close_loan(&self, loan: &Loan) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE peminjaman SET tanggal_kembali = $2, status = $3
            WHERE id = $1 AND tanggal_kembali IS NULL
            "#,
        )
        .bind(loan.id)
        .bind(loan.return_date)
        .bind(status_to_column(loan.status))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
