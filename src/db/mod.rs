mod schema;

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::error::{LedgerError, Result};
use crate::models::*;
use crate::store::{default_categories, CategoryRegistry, Store};

const SEEDED_KEY: &str = "categories_seeded";
const DEFAULT_CURRENCY: &str = "KSH";

const RECORD_COLUMNS: &str = "id, date, category, description, amount, type, created_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file. A missing file is an empty ledger.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        log::debug!("opened database {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_defaults()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            log::info!("created schema version {}", schema::CURRENT_VERSION);
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        if current > schema::CURRENT_VERSION {
            return Err(LedgerError::corrupt(
                "schema_version",
                format!(
                    "database is version {current}, newest known is {}",
                    schema::CURRENT_VERSION
                ),
            ));
        }
        if current < schema::CURRENT_VERSION {
            // Every table is created with IF NOT EXISTS, so a partial schema is completed
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute("DELETE FROM schema_version", [])?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            log::info!("migrated schema {current} -> {}", schema::CURRENT_VERSION);
        }

        Ok(())
    }

    /// Seed categories once per database; deleting them all later does not bring them back.
    fn seed_defaults(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES ('currency', ?1)",
            params![DEFAULT_CURRENCY],
        )?;
        let seeded: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?1)",
            params![SEEDED_KEY],
            |row| row.get(0),
        )?;
        if !seeded {
            let defaults = default_categories();
            for cat in &defaults {
                tx.execute(
                    "INSERT OR IGNORE INTO categories (name, type) VALUES (?1, ?2)",
                    params![cat.name, cat.kind.as_str()],
                )?;
            }
            tx.execute(
                "INSERT INTO settings (key, value) VALUES (?1, '1')",
                params![SEEDED_KEY],
            )?;
            log::info!("seeded {} default categories", defaults.len());
        }
        tx.commit()?;
        Ok(())
    }

    // ── Settings ──────────────────────────────────────────────

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn currency(&self) -> Result<String> {
        Ok(self
            .get_setting("currency")?
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
    }

    // ── Budgets ───────────────────────────────────────────────

    pub fn get_budgets(&self, year_month: &str) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category, year_month, monthly_limit FROM budgets
             WHERE year_month = ?1 ORDER BY category",
        )?;
        let rows = stmt.query_map(params![year_month], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut budgets = Vec::new();
        for row in rows {
            let (id, category, year_month, limit) = row?;
            budgets.push(Budget {
                id: Some(id),
                category,
                year_month,
                monthly_limit: parse_stored_decimal(&limit, id)?,
            });
        }
        Ok(budgets)
    }

    pub fn upsert_budget(&self, budget: &Budget) -> Result<()> {
        self.conn.execute(
            "INSERT INTO budgets (category, monthly_limit, year_month)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(category, year_month) DO UPDATE SET monthly_limit = ?2",
            params![
                budget.category,
                budget.monthly_limit.to_string(),
                budget.year_month,
            ],
        )?;
        Ok(())
    }

    pub fn delete_budget(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM budgets WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }
}

// ── Transactions ──────────────────────────────────────────────

struct RecordRow {
    id: i64,
    date: String,
    category: String,
    description: String,
    amount: String,
    kind: String,
    created_at: String,
}

impl RecordRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            date: row.get(1)?,
            category: row.get(2)?,
            description: row.get(3)?,
            amount: row.get(4)?,
            kind: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<Record> {
        let id = self.id;
        let location = || format!("transaction {id}");
        let date = parse_date(&self.date)
            .map_err(|e| LedgerError::corrupt(location(), e.to_string()))?;
        let kind = TxnType::parse(&self.kind)
            .map_err(|e| LedgerError::corrupt(location(), e.to_string()))?;
        let amount = parse_stored_decimal(&self.amount, id)?;
        Ok(Record {
            id: Some(id),
            date,
            category: self.category,
            description: self.description,
            amount,
            kind,
            created_at: self.created_at,
        })
    }
}

fn parse_stored_decimal(s: &str, id: i64) -> Result<Decimal> {
    Decimal::from_str(s)
        .map_err(|_| LedgerError::corrupt(format!("row {id}"), format!("'{s}' is not a decimal")))
}

impl Store for Database {
    fn add(&mut self, record: &Record) -> Result<i64> {
        record.validate()?;
        self.conn.execute(
            "INSERT INTO transactions (date, category, description, amount, type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.date.format("%Y-%m-%d").to_string(),
                record.category.trim(),
                record.description.trim(),
                record.amount.to_string(),
                record.kind.as_str(),
                record.created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        log::debug!("added transaction {id}");
        Ok(id)
    }

    fn get(&self, id: i64) -> Result<Option<Record>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM transactions WHERE id = ?1"),
                params![id],
                RecordRow::from_row,
            )
            .optional()?;
        row.map(RecordRow::into_record).transpose()
    }

    fn get_all(&self) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM transactions ORDER BY date DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], RecordRow::from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    fn update(&mut self, id: i64, record: &Record) -> Result<bool> {
        record.validate()?;
        let n = self.conn.execute(
            "UPDATE transactions
             SET date = ?1, category = ?2, description = ?3, amount = ?4, type = ?5
             WHERE id = ?6",
            params![
                record.date.format("%Y-%m-%d").to_string(),
                record.category.trim(),
                record.description.trim(),
                record.amount.to_string(),
                record.kind.as_str(),
                id,
            ],
        )?;
        log::debug!("update transaction {id}: {n} row(s)");
        Ok(n > 0)
    }

    fn delete(&mut self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        log::debug!("delete transaction {id}: {n} row(s)");
        Ok(n > 0)
    }

    fn clear_all(&mut self) -> Result<()> {
        let n = self.conn.execute("DELETE FROM transactions", [])?;
        log::info!("cleared {n} transactions");
        Ok(())
    }
}

// ── Categories ────────────────────────────────────────────────

impl CategoryRegistry for Database {
    fn list_categories(&self, kind: Option<TxnType>) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, type, color, icon FROM categories
             WHERE ?1 IS NULL OR type = ?1
             ORDER BY type, name",
        )?;
        let rows = stmt.query_map(params![kind.map(|k| k.as_str())], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;
        let mut categories = Vec::new();
        for row in rows {
            let (id, name, kind, color, icon) = row?;
            let kind = TxnType::parse(&kind)
                .map_err(|e| LedgerError::corrupt(format!("category {id}"), e.to_string()))?;
            categories.push(Category {
                id: Some(id),
                name,
                kind,
                color,
                icon,
            });
        }
        Ok(categories)
    }

    fn add_category(&mut self, category: &Category) -> Result<bool> {
        category.validate()?;
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO categories (name, type, color, icon) VALUES (?1, ?2, ?3, ?4)",
            params![
                category.name.trim(),
                category.kind.as_str(),
                category.color,
                category.icon,
            ],
        )?;
        log::debug!("add category '{}': {n} row(s)", category.name);
        Ok(n > 0)
    }

    fn delete_category(&mut self, name: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM categories WHERE name = ?1", params![name.trim()])?;
        log::debug!("delete category '{name}': {n} row(s)");
        Ok(n > 0)
    }
}
