#![allow(dead_code)]

use datamapper_core::{DomainObject, LazyHandlers, LazyState, Schema, Value};
use datamapper_store::errors::from_rusqlite;
use datamapper_store::{ActiveObject, Binding, Mapper, MapperConfig, Session};
use rusqlite::OptionalExtension;
use std::cell::Cell;
use std::sync::OnceLock;

pub const DEFAULT_CREATED_AT: &str = "2026-01-01T00:00:00Z";

thread_local! {
    static BIO_LOADS: Cell<usize> = const { Cell::new(0) };
    static BIO_SAVES: Cell<usize> = const { Cell::new(0) };
}

/// Biography loader invocations on this test thread
pub fn bio_loads() -> usize {
    BIO_LOADS.with(Cell::get)
}

/// Biography saver invocations on this test thread
pub fn bio_saves() -> usize {
    BIO_SAVES.with(Cell::get)
}

/// Open an in-memory session with the test schema applied
pub fn setup_session() -> Session {
    let session = Session::open_in_memory().unwrap();
    session
        .conn()
        .execute_batch(&format!(
            "CREATE TABLE authors (
                id INTEGER PRIMARY KEY,
                full_name TEXT NOT NULL,
                email TEXT,
                password_hash TEXT,
                created_at TEXT NOT NULL DEFAULT '{}'
            );
            CREATE TABLE author_bios (
                author_id INTEGER PRIMARY KEY REFERENCES authors(id) ON DELETE CASCADE,
                body TEXT
            );
            CREATE TABLE books (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                author_id INTEGER
            );
            CREATE TABLE ghosts (
                id INTEGER PRIMARY KEY,
                label TEXT
            );
            CREATE TRIGGER ghosts_vanish AFTER INSERT ON ghosts
            BEGIN
                DELETE FROM ghosts WHERE id = NEW.id;
            END;",
            DEFAULT_CREATED_AT
        ))
        .unwrap();
    session
}

/// Insert authors "Author 1" .. "Author n" directly, bypassing the mapper
pub fn seed_authors(session: &Session, n: usize) {
    for i in 1..=n {
        session
            .conn()
            .execute(
                "INSERT INTO authors (full_name, email, password_hash) VALUES (?1, ?2, 'secret')",
                rusqlite::params![format!("Author {}", i), format!("author{}@example.org", i)],
            )
            .unwrap();
    }
}

pub fn insert_bio(session: &Session, author_id: i64, body: &str) {
    session
        .conn()
        .execute(
            "INSERT INTO author_bios (author_id, body) VALUES (?1, ?2)",
            rusqlite::params![author_id, body],
        )
        .unwrap();
}

pub fn stored_bio(session: &Session, author_id: i64) -> Option<String> {
    session
        .conn()
        .query_row(
            "SELECT body FROM author_bios WHERE author_id = ?1",
            [author_id],
            |r| r.get(0),
        )
        .optional()
        .unwrap()
        .flatten()
}

pub fn row_count(session: &Session, table: &str) -> i64 {
    session
        .conn()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}

// ========== Author ==========

/// Author with a renamed column (`full_name` -> `name`), a dropped column
/// (`password_hash`), a server default (`created_at`) and a lazy `biography`
/// stored in its own table
#[derive(Debug, Clone, Default)]
pub struct Author {
    pub id: Option<i64>,
    pub name: String,
    pub email: Option<String>,
    pub created_at: Option<String>,
    pub biography: Option<String>,
    pub lazy: LazyState,
    pub binding: Binding<AuthorMapper>,
}

impl Author {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

fn load_biography(author: &mut Author) -> datamapper_core::Result<Value> {
    BIO_LOADS.with(|c| c.set(c.get() + 1));
    let Some(id) = author.id else {
        return Ok(Value::Null);
    };
    let session = author.binding.lazy_session()?.clone();
    let body: Option<String> = session
        .conn()
        .query_row(
            "SELECT body FROM author_bios WHERE author_id = ?1",
            [id],
            |r| r.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?
        .flatten();
    author.biography = body.clone();
    Ok(body.into())
}

fn persist_biography(author: &Author) -> datamapper_core::Result<()> {
    BIO_SAVES.with(|c| c.set(c.get() + 1));
    let Some(id) = author.id else {
        return Ok(());
    };
    author
        .binding
        .session()?
        .conn()
        .execute(
            "INSERT INTO author_bios (author_id, body) VALUES (?1, ?2)
             ON CONFLICT(author_id) DO UPDATE SET body = excluded.body",
            rusqlite::params![id, author.biography],
        )
        .map_err(from_rusqlite)?;
    Ok(())
}

impl DomainObject for Author {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Author>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Author>::builder("Author")
                .identity(
                    "id",
                    |a| a.id.into(),
                    |a, v| {
                        a.id = v.extract()?;
                        Ok(())
                    },
                )
                .property(
                    "name",
                    |a| a.name.as_str().into(),
                    |a, v| {
                        a.name = v.extract()?;
                        Ok(())
                    },
                )
                .property(
                    "email",
                    |a| a.email.clone().into(),
                    |a, v| {
                        a.email = v.extract()?;
                        Ok(())
                    },
                )
                .property(
                    "created_at",
                    |a| a.created_at.clone().into(),
                    |a, v| {
                        a.created_at = v.extract()?;
                        Ok(())
                    },
                )
                .lazy(
                    "biography",
                    LazyHandlers::<Author>::new()
                        .load(load_biography)
                        .peek(|a| a.biography.clone().into())
                        .store(|a, v| {
                            a.biography = v.extract()?;
                            Ok(())
                        })
                        .persist(persist_biography),
                )
                .track_loaded(|a| &a.lazy, |a| &mut a.lazy)
                .build()
        })
    }
}

impl ActiveObject for Author {
    type Mapper = AuthorMapper;

    fn binding(&self) -> &Binding<AuthorMapper> {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut Binding<AuthorMapper> {
        &mut self.binding
    }
}

pub struct AuthorMapper {
    session: Session,
}

impl Mapper for AuthorMapper {
    type Object = Author;

    fn from_session(session: Session) -> Self {
        Self { session }
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn config() -> &'static MapperConfig {
        static CONFIG: OnceLock<MapperConfig> = OnceLock::new();
        CONFIG.get_or_init(|| {
            MapperConfig::builder("AuthorMapper")
                .table("authors")
                .primary_key("id")
                .column("full_name", "name")
                .drop_column("password_hash")
                .build()
        })
    }
}

// ========== Book ==========

/// Book whose mapper opts in to deletion
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub id: Option<i64>,
    pub title: String,
    pub author_id: Option<i64>,
    pub binding: Binding<BookMapper>,
}

impl DomainObject for Book {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Book>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Book>::builder("Book")
                .identity(
                    "id",
                    |b| b.id.into(),
                    |b, v| {
                        b.id = v.extract()?;
                        Ok(())
                    },
                )
                .property(
                    "title",
                    |b| b.title.as_str().into(),
                    |b, v| {
                        b.title = v.extract()?;
                        Ok(())
                    },
                )
                .property(
                    "author_id",
                    |b| b.author_id.into(),
                    |b, v| {
                        b.author_id = v.extract()?;
                        Ok(())
                    },
                )
                .build()
        })
    }
}

impl ActiveObject for Book {
    type Mapper = BookMapper;

    fn binding(&self) -> &Binding<BookMapper> {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut Binding<BookMapper> {
        &mut self.binding
    }
}

pub struct BookMapper {
    session: Session,
}

impl Mapper for BookMapper {
    type Object = Book;

    fn from_session(session: Session) -> Self {
        Self { session }
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn config() -> &'static MapperConfig {
        static CONFIG: OnceLock<MapperConfig> = OnceLock::new();
        CONFIG.get_or_init(|| {
            MapperConfig::builder("BookMapper")
                .table("books")
                .primary_key("id")
                .build()
        })
    }

    fn delete_object(&self, object: &Book) -> datamapper_store::Result<()> {
        self.delete_row(object).map(|_| ())
    }
}

// ========== Ghost ==========

/// Rows vanish right after insert (see the `ghosts_vanish` trigger), so the
/// post-write re-read always misses
#[derive(Debug, Clone, Default)]
pub struct Ghost {
    pub id: Option<i64>,
    pub label: Option<String>,
    pub binding: Binding<GhostMapper>,
}

impl DomainObject for Ghost {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Ghost>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Ghost>::builder("Ghost")
                .identity(
                    "id",
                    |g| g.id.into(),
                    |g, v| {
                        g.id = v.extract()?;
                        Ok(())
                    },
                )
                .property(
                    "label",
                    |g| g.label.clone().into(),
                    |g, v| {
                        g.label = v.extract()?;
                        Ok(())
                    },
                )
                .build()
        })
    }
}

impl ActiveObject for Ghost {
    type Mapper = GhostMapper;

    fn binding(&self) -> &Binding<GhostMapper> {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut Binding<GhostMapper> {
        &mut self.binding
    }
}

pub struct GhostMapper {
    session: Session,
}

impl Mapper for GhostMapper {
    type Object = Ghost;

    fn from_session(session: Session) -> Self {
        Self { session }
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn config() -> &'static MapperConfig {
        static CONFIG: OnceLock<MapperConfig> = OnceLock::new();
        CONFIG.get_or_init(|| {
            MapperConfig::builder("GhostMapper")
                .table("ghosts")
                .primary_key("id")
                .build()
        })
    }
}
