//! Row types for the PostgreSQL schema and their mapping to the domain.
//!
//! The tables keep the school's original column names (`judul`, `stok_total`,
//! `kelas`, ...). Nothing outside this module sees them.

use chrono::NaiveDate;
use sqlx::FromRow;

use crate::{
    error::{AppError, AppResult},
    models::{Book, Borrower, Loan, LoanStatus},
};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct BookRow {
    pub kode_buku: String,
    pub judul: String,
    pub penulis: String,
    pub penerbit: String,
    pub tahun_terbit: Option<i32>,
    pub kategori: Option<String>,
    pub isbn: Option<String>,
    pub stok_total: i32,
    pub stok_tersedia: i32,
}

impl TryFrom<BookRow> for Book {
    type Error = AppError;

    fn try_from(row: BookRow) -> AppResult<Self> {
        Ok(Self {
            stock_total: stock_from_column(&row.kode_buku, "stok_total", row.stok_total)?,
            stock_available: stock_from_column(&row.kode_buku, "stok_tersedia", row.stok_tersedia)?,
            code: row.kode_buku,
            title: row.judul,
            author: row.penulis,
            publisher: row.penerbit,
            year: row.tahun_terbit,
            category: row.kategori,
            isbn: row.isbn,
        })
    }
}

impl TryFrom<&Book> for BookRow {
    type Error = AppError;

    fn try_from(book: &Book) -> AppResult<Self> {
        Ok(Self {
            kode_buku: book.code.clone(),
            judul: book.title.clone(),
            penulis: book.author.clone(),
            penerbit: book.publisher.clone(),
            tahun_terbit: book.year,
            kategori: book.category.clone(),
            isbn: book.isbn.clone(),
            stok_total: stock_to_column(book.stock_total)?,
            stok_tersedia: stock_to_column(book.stock_available)?,
        })
    }
}

fn stock_from_column(code: &str, column: &str, value: i32) -> AppResult<u32> {
    u32::try_from(value).map_err(|_| {
        AppError::Persistence(format!("Negative {} ({}) stored for book {}", column, value, code))
    })
}

fn stock_to_column(value: u32) -> AppResult<i32> {
    i32::try_from(value)
        .map_err(|_| AppError::Validation(format!("Stock count {} is too large", value)))
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct BorrowerRow {
    pub nisn: String,
    pub nama_siswa: String,
    pub kelas: String,
}

impl From<BorrowerRow> for Borrower {
    fn from(row: BorrowerRow) -> Self {
        Self {
            id: row.nisn,
            name: row.nama_siswa,
            class_name: row.kelas,
        }
    }
}

impl From<&Borrower> for BorrowerRow {
    fn from(borrower: &Borrower) -> Self {
        Self {
            nisn: borrower.id.clone(),
            nama_siswa: borrower.name.clone(),
            kelas: borrower.class_name.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct LoanRow {
    pub id: i64,
    pub nisn: String,
    pub kode_buku: String,
    pub tanggal_pinjam: NaiveDate,
    pub jatuh_tempo: NaiveDate,
    pub tanggal_kembali: Option<NaiveDate>,
    pub status: String,
}

impl From<LoanRow> for Loan {
    fn from(row: LoanRow) -> Self {
        Self {
            id: row.id,
            book_code: row.kode_buku,
            borrower_id: row.nisn,
            borrow_date: row.tanggal_pinjam,
            due_date: row.jatuh_tempo,
            status: status_from_column(&row.status, row.tanggal_kembali),
            return_date: row.tanggal_kembali,
        }
    }
}

/// Older rows may carry `borrowed` or a stale `overdue`; both mean the
/// loan is still out. Overdue is re-derived from the due date on read.
fn status_from_column(status: &str, returned_on: Option<NaiveDate>) -> LoanStatus {
    if status.eq_ignore_ascii_case("returned") || returned_on.is_some() {
        LoanStatus::Returned
    } else {
        LoanStatus::Active
    }
}

/// Value written to `peminjaman.status`
pub(crate) fn status_to_column(status: LoanStatus) -> &'static str {
    match status {
        LoanStatus::Returned => "returned",
        LoanStatus::Active | LoanStatus::Overdue => "active",
    }
}
