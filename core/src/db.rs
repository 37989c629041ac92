use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::{Connection, params};

use crate::models::{Favorite, NewFavorite};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open the database named by a `DATABASE_URL`-style string.
    ///
    /// Accepts `sqlite::memory:`, `sqlite://<path>`, `sqlite:<path>` or a bare path.
    pub fn open_url(url: &str) -> Result<Self> {
        let url = url.trim();
        if url == "sqlite::memory:" || url == ":memory:" {
            return Self::open_in_memory();
        }
        if let Some((scheme, _)) = url.split_once("://") {
            if scheme != "sqlite" {
                bail!("Unsupported DATABASE_URL scheme '{scheme}'. Only sqlite is supported");
            }
        }
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        if path.is_empty() {
            bail!("DATABASE_URL does not name a database file");
        }
        Self::open(Path::new(path))
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            // (user_id, recipe_id) is intentionally not unique.
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS favorites (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL,
                    recipe_id INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    image TEXT,
                    cook_time TEXT,
                    servings TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_favorites_user ON favorites(user_id);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    fn favorite_from_row(row: &rusqlite::Row) -> rusqlite::Result<Favorite> {
        Ok(Favorite {
            id: row.get(0)?,
            user_id: row.get(1)?,
            recipe_id: row.get(2)?,
            title: row.get(3)?,
            image: row.get(4)?,
            cook_time: row.get(5)?,
            servings: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    // --- Favorites ---

    pub fn insert_favorite(&self, favorite: &NewFavorite) -> Result<Favorite> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO favorites (user_id, recipe_id, title, image, cook_time, servings, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                favorite.user_id,
                favorite.recipe_id,
                favorite.title,
                favorite.image,
                favorite.cook_time,
                favorite.servings,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_favorite_by_id(id)
    }

    pub fn get_favorite_by_id(&self, id: i64) -> Result<Favorite> {
        self.conn
            .query_row(
                "SELECT id, user_id, recipe_id, title, image, cook_time, servings, created_at
                 FROM favorites WHERE id = ?1",
                params![id],
                Self::favorite_from_row,
            )
            .with_context(|| format!("Favorite with id {id} not found"))
    }

    pub fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, recipe_id, title, image, cook_time, servings, created_at
             FROM favorites WHERE user_id = ?1 ORDER BY id",
        )?;
        let favorites = stmt
            .query_map(params![user_id], Self::favorite_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(favorites)
    }

    /// Remove every favorite matching the pair. Returns how many rows went away,
    /// which is zero when nothing matched.
    pub fn delete_favorite(&self, user_id: &str, recipe_id: i64) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM favorites WHERE user_id = ?1 AND recipe_id = ?2",
            params![user_id, recipe_id],
        )?;
        Ok(rows)
    }
}
