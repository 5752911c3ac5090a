//! SQLite mirror of the collection
//!
//! Stores the same records as the JSON document in three tables, replaced
//! wholesale on every write.

use crate::model::{Collection, HerbRecord, ImageRef};
use crate::output::traits::{OutputHandler, OutputResult};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQL schema for the mirror database
pub const SCHEMA_SQL: &str = r#"
-- One row per record
CREATE TABLE IF NOT EXISTS herbs (
    position INTEGER NOT NULL,
    id TEXT PRIMARY KEY,
    source_url TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    summary TEXT,
    license TEXT NOT NULL
);

-- Normalized sections
CREATE TABLE IF NOT EXISTS sections (
    herb_id TEXT NOT NULL REFERENCES herbs(id),
    key TEXT NOT NULL,
    body TEXT NOT NULL,
    PRIMARY KEY (herb_id, key)
);

-- Images, primary first
CREATE TABLE IF NOT EXISTS images (
    herb_id TEXT NOT NULL REFERENCES herbs(id),
    position INTEGER NOT NULL,
    page_url TEXT,
    thumb_url TEXT,
    file_url TEXT,
    file_title TEXT,
    width INTEGER,
    height INTEGER,
    size_bytes INTEGER,
    license TEXT,
    PRIMARY KEY (herb_id, position)
);
"#;

/// Writes collections into a SQLite database
pub struct SqliteOutput {
    conn: Connection,
}

impl SqliteOutput {
    /// Opens (or creates) the database at `path`
    pub fn open(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Creates an in-memory database
    pub fn in_memory() -> OutputResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> OutputResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Reads the stored collection back in its original order
    pub fn load_collection(&self) -> OutputResult<Collection> {
        let mut herbs = self.conn.prepare(
            "SELECT id, source_url, name, summary, license FROM herbs ORDER BY position",
        )?;
        let mut sections = self
            .conn
            .prepare("SELECT key, body FROM sections WHERE herb_id = ?1")?;
        let mut images = self.conn.prepare(
            "SELECT page_url, thumb_url, file_url, file_title, width, height, size_bytes, license
             FROM images WHERE herb_id = ?1 ORDER BY position",
        )?;

        let rows = herbs.query_map([], |row| {
            Ok(HerbRecord {
                id: row.get(0)?,
                source_url: row.get(1)?,
                name: row.get(2)?,
                summary: row.get(3)?,
                sections: Default::default(),
                images: Vec::new(),
                license: row.get(4)?,
            })
        })?;

        let mut collection = Collection::new();
        for row in rows {
            let mut record = row?;
            for section in sections.query_map([&record.id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })? {
                let (key, body) = section?;
                record.sections.insert(key, body);
            }
            for image in images.query_map([&record.id], |row| {
                Ok(ImageRef {
                    page_url: row.get(0)?,
                    thumb_url: row.get(1)?,
                    file_url: row.get(2)?,
                    file_title: row.get(3)?,
                    width: row.get::<_, Option<i64>>(4)?.map(|v| v as u64),
                    height: row.get::<_, Option<i64>>(5)?.map(|v| v as u64),
                    size_bytes: row.get::<_, Option<i64>>(6)?.map(|v| v as u64),
                    license: row.get(7)?,
                })
            })? {
                record.images.push(image?);
            }
            collection.push(record);
        }

        Ok(collection)
    }
}

impl OutputHandler for SqliteOutput {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn write_collection(&mut self, collection: &Collection) -> OutputResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch("DELETE FROM images; DELETE FROM sections; DELETE FROM herbs;")?;

        {
            let mut insert_herb = tx.prepare(
                "INSERT INTO herbs (position, id, source_url, name, summary, license)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let mut insert_section =
                tx.prepare("INSERT INTO sections (herb_id, key, body) VALUES (?1, ?2, ?3)")?;
            let mut insert_image = tx.prepare(
                "INSERT INTO images (herb_id, position, page_url, thumb_url, file_url,
                                     file_title, width, height, size_bytes, license)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;

            for (position, record) in collection.iter().enumerate() {
                insert_herb.execute(params![
                    position as i64,
                    record.id,
                    record.source_url,
                    record.name,
                    record.summary,
                    record.license,
                ])?;
                for (key, body) in &record.sections {
                    insert_section.execute(params![record.id, key, body])?;
                }
                for (index, image) in record.images.iter().enumerate() {
                    insert_image.execute(params![
                        record.id,
                        index as i64,
                        image.page_url,
                        image.thumb_url,
                        image.file_url,
                        image.file_title,
                        image.width.map(|v| v as i64),
                        image.height.map(|v| v as i64),
                        image.size_bytes.map(|v| v as i64),
                        image.license,
                    ])?;
                }
            }
        }

        tx.commit()?;
        tracing::info!("Mirrored {} records to SQLite", collection.len());
        Ok(())
    }
}
