//! Book records and mutation payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A book record as stored and as carried on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub published_year: i32,
    pub genre: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog summary: total count plus counts per genre and per publication year
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookStats {
    pub total: usize,
    pub by_genre: BTreeMap<String, usize>,
    pub by_year: BTreeMap<i32, usize>,
}

impl BookStats {
    pub fn from_books(books: &[Book]) -> Self {
        let mut stats = Self {
            total: books.len(),
            ..Self::default()
        };
        for book in books {
            *stats.by_genre.entry(book.genre.clone()).or_default() += 1;
            *stats.by_year.entry(book.published_year).or_default() += 1;
        }
        stats
    }
}

/// A year as sent by clients: forms post strings, scripts post numbers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum YearInput {
    Number(i64),
    Text(String),
}

impl YearInput {
    /// Parse into a calendar year, rejecting non-numeric text and out-of-range values.
    pub fn parse(&self) -> Option<i32> {
        match self {
            YearInput::Number(n) => i32::try_from(*n).ok(),
            YearInput::Text(s) => s.trim().parse::<i32>().ok(),
        }
    }
}

impl fmt::Display for YearInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearInput::Number(n) => write!(f, "{}", n),
            YearInput::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Body of `POST /api/books`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<YearInput>,
    pub genre: Option<String>,
}

/// Body of `PUT /api/books/{id}` — only provided fields are applied
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<YearInput>,
    pub genre: Option<String>,
}

/// A validated book ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub published_year: i32,
    pub genre: String,
}

/// A validated partial update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub genre: Option<String>,
}

impl BookPatch {
    /// Merge the provided fields into `book`. Does not touch timestamps.
    pub fn apply_to(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(isbn) = self.isbn {
            book.isbn = isbn;
        }
        if let Some(year) = self.published_year {
            book.published_year = year;
        }
        if let Some(genre) = self.genre {
            book.genre = genre;
        }
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(format!("Field '{}' is required", field)),
    }
}

fn non_blank(field: &str, value: Option<String>) -> Result<Option<String>, String> {
    match value {
        Some(v) if v.trim().is_empty() => Err(format!("Field '{}' must not be empty", field)),
        other => Ok(other),
    }
}

/// Year 0 is never a real publication year; create and update both refuse it.
fn parse_year(year: &YearInput) -> Result<i32, String> {
    year.parse()
        .filter(|&y| y != 0)
        .ok_or_else(|| format!("Invalid publishedYear: {}", year))
}

impl CreateBookRequest {
    /// Check that every field is present and well-formed.
    pub fn validate(self) -> Result<NewBook, String> {
        let title = required("title", self.title)?;
        let author = required("author", self.author)?;
        let isbn = required("isbn", self.isbn)?;
        let genre = required("genre", self.genre)?;
        let published_year = match self.published_year {
            Some(ref y) => parse_year(y)?,
            None => return Err("Field 'publishedYear' is required".to_string()),
        };

        Ok(NewBook {
            title,
            author,
            isbn,
            published_year,
            genre,
        })
    }
}

impl UpdateBookRequest {
    /// Check the provided fields; absent fields stay untouched.
    pub fn validate(self) -> Result<BookPatch, String> {
        Ok(BookPatch {
            title: non_blank("title", self.title)?,
            author: non_blank("author", self.author)?,
            isbn: non_blank("isbn", self.isbn)?,
            published_year: self.published_year.as_ref().map(parse_year).transpose()?,
            genre: non_blank("genre", self.genre)?,
        })
    }
}
