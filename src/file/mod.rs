//! Flat-file backend: two pretty-printed JSON arrays in one directory, plus
//! `meta.json` holding the id high-water mark.
//!
//! Every call reads the files fresh and every mutation rewrites the whole
//! file through a temp file and rename. Ids are never handed out twice, even
//! after the newest record is deleted or the store is cleared. Entries are validated on load;
//! files written by older versions that only stored `category`,
//! `description`, `amount` and `date` are migrated (type Expense, ids
//! assigned in file order) rather than trusted.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{LedgerError, Result};
use crate::models::{parse_date, Category, Record, TxnType};
use crate::store::{default_categories, CategoryRegistry, Store};

pub const RECORDS_FILE: &str = "transactions.json";
pub const CATEGORIES_FILE: &str = "categories.json";
pub const META_FILE: &str = "meta.json";

pub struct JsonStore {
    records_path: PathBuf,
    categories_path: PathBuf,
    meta_path: PathBuf,
}

/// Next id to assign. Missing file means no id has been issued yet.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Meta {
    #[serde(default)]
    next_id: i64,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    id: Option<i64>,
    date: Option<String>,
    category: Option<String>,
    description: Option<String>,
    amount: Option<serde_json::Number>,
    #[serde(rename = "type")]
    kind: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct StoredEntry<'a> {
    id: i64,
    date: String,
    category: &'a str,
    description: &'a str,
    amount: serde_json::Number,
    #[serde(rename = "type")]
    kind: &'static str,
    created_at: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCategory {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    icon: Option<String>,
}

impl JsonStore {
    /// Use `dir` for both files, creating it if needed. The category file is
    /// seeded with the defaults the first time only.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let store = Self {
            records_path: dir.join(RECORDS_FILE),
            categories_path: dir.join(CATEGORIES_FILE),
            meta_path: dir.join(META_FILE),
        };
        if !store.categories_path.exists() {
            let defaults = default_categories();
            store.save_categories(&defaults)?;
            log::info!("seeded {} default categories", defaults.len());
        }
        Ok(store)
    }

    fn stored_next_id(&self) -> Result<i64> {
        let meta: Meta = read_json(&self.meta_path)?;
        Ok(meta.next_id)
    }

    /// Lowest id that was never issued: past both the stored mark and every id on file.
    fn next_id(&self, records: &[Record]) -> Result<i64> {
        let past_records = records.iter().filter_map(|r| r.id).max().unwrap_or(0) + 1;
        Ok(self.stored_next_id()?.max(past_records))
    }

    fn save_next_id(&self, next_id: i64) -> Result<()> {
        write_json_atomic(&self.meta_path, &Meta { next_id })
    }

    fn load_records(&self) -> Result<Vec<Record>> {
        let raw: Vec<RawEntry> = read_json(&self.records_path)?;
        let location = self.records_path.display().to_string();

        // Entries without an id are numbered in file order, after every issued id
        let past_file = raw.iter().filter_map(|e| e.id).max().unwrap_or(0) + 1;
        let mut next_id = self.stored_next_id()?.max(past_file);
        let mut seen = std::collections::HashSet::new();
        let mut migrated = 0;
        let mut records = Vec::with_capacity(raw.len());

        for (index, entry) in raw.into_iter().enumerate() {
            let was_legacy = entry.id.is_none() || entry.kind.is_none();
            let mut record = validate_entry(entry, index, &location)?;
            let id = match record.id {
                Some(id) => id,
                None => {
                    next_id += 1;
                    next_id - 1
                }
            };
            if !seen.insert(id) {
                return Err(LedgerError::corrupt(
                    format!("{location} entry {index}"),
                    format!("duplicate id {id}"),
                ));
            }
            record.id = Some(id);
            if was_legacy {
                migrated += 1;
            }
            records.push(record);
        }

        if migrated > 0 {
            log::warn!("migrated {migrated} legacy entries from {location}");
        }
        Ok(records)
    }

    fn save_records(&self, records: &[Record]) -> Result<()> {
        let mut stored = Vec::with_capacity(records.len());
        for r in records {
            let id = r.id.ok_or_else(|| {
                LedgerError::corrupt(self.records_path.display().to_string(), "record without id")
            })?;
            stored.push(StoredEntry {
                id,
                date: r.date.format("%Y-%m-%d").to_string(),
                category: r.category.trim(),
                description: r.description.trim(),
                amount: decimal_to_number(r.amount)?,
                kind: r.kind.as_str(),
                created_at: &r.created_at,
            });
        }
        write_json_atomic(&self.records_path, &stored)
    }

    fn load_categories(&self) -> Result<Vec<Category>> {
        let stored: Vec<StoredCategory> = read_json(&self.categories_path)?;
        let location = self.categories_path.display().to_string();
        stored
            .into_iter()
            .enumerate()
            .map(|(index, c)| {
                let kind = TxnType::parse(&c.kind).map_err(|e| {
                    LedgerError::corrupt(format!("{location} entry {index}"), e.to_string())
                })?;
                Ok(Category {
                    id: None,
                    name: c.name,
                    kind,
                    color: c.color,
                    icon: c.icon,
                })
            })
            .collect()
    }

    fn save_categories(&self, categories: &[Category]) -> Result<()> {
        let stored: Vec<StoredCategory> = categories
            .iter()
            .map(|c| StoredCategory {
                name: c.name.clone(),
                kind: c.kind.as_str().to_string(),
                color: c.color.clone(),
                icon: c.icon.clone(),
            })
            .collect();
        write_json_atomic(&self.categories_path, &stored)
    }
}

/// Turn one file entry into a Record, or say exactly what is wrong with it.
fn validate_entry(entry: RawEntry, index: usize, location: &str) -> Result<Record> {
    let corrupt = |reason: String| LedgerError::corrupt(format!("{location} entry {index}"), reason);

    let date = entry
        .date
        .ok_or_else(|| corrupt("missing date".into()))
        .and_then(|d| parse_date(&d).map_err(|e| corrupt(e.to_string())))?;
    let amount = entry
        .amount
        .ok_or_else(|| corrupt("missing amount".into()))
        .and_then(|n| {
            Decimal::from_str(&n.to_string())
                .map_err(|_| corrupt(format!("amount {n} is not a decimal")))
        })?;
    let kind = match entry.kind {
        Some(k) => TxnType::parse(&k).map_err(|e| corrupt(e.to_string()))?,
        None => TxnType::Expense,
    };

    let record = Record {
        id: entry.id,
        date,
        category: entry.category.ok_or_else(|| corrupt("missing category".into()))?,
        description: entry
            .description
            .ok_or_else(|| corrupt("missing description".into()))?,
        amount,
        kind,
        created_at: entry.created_at.unwrap_or_default(),
    };
    record.validate().map_err(|e| corrupt(e.to_string()))?;
    Ok(record)
}

fn decimal_to_number(amount: Decimal) -> Result<serde_json::Number> {
    if amount.fract().is_zero() {
        if let Some(n) = amount.to_i64() {
            return Ok(n.into());
        }
    }
    amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| LedgerError::validation("amount", format!("{amount} cannot be stored")))
}

/// Read a JSON file, returning the default value if it doesn't exist.
fn read_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|e| {
        LedgerError::corrupt(path.display().to_string(), e.to_string())
    })
}

/// Write to a temp file in the same directory, then rename over the target.
fn write_json_atomic<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    let mut writer = BufWriter::new(File::create(&temp_path)?);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    drop(writer);
    fs::rename(&temp_path, path)?;
    Ok(())
}

impl Store for JsonStore {
    fn add(&mut self, record: &Record) -> Result<i64> {
        record.validate()?;
        let mut records = self.load_records()?;
        let id = self.next_id(&records)?;
        self.save_next_id(id + 1)?;
        let mut new = record.clone();
        new.id = Some(id);
        records.push(new);
        self.save_records(&records)?;
        log::debug!("added transaction {id}");
        Ok(id)
    }

    fn get(&self, id: i64) -> Result<Option<Record>> {
        Ok(self
            .load_records()?
            .into_iter()
            .find(|r| r.id == Some(id)))
    }

    fn get_all(&self) -> Result<Vec<Record>> {
        let mut records = self.load_records()?;
        records.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    fn update(&mut self, id: i64, record: &Record) -> Result<bool> {
        record.validate()?;
        let mut records = self.load_records()?;
        let Some(existing) = records.iter_mut().find(|r| r.id == Some(id)) else {
            return Ok(false);
        };
        existing.date = record.date;
        existing.category = record.category.clone();
        existing.description = record.description.clone();
        existing.amount = record.amount;
        existing.kind = record.kind;
        self.save_records(&records)?;
        log::debug!("updated transaction {id}");
        Ok(true)
    }

    fn delete(&mut self, id: i64) -> Result<bool> {
        let mut records = self.load_records()?;
        let next_id = self.next_id(&records)?;
        let before = records.len();
        records.retain(|r| r.id != Some(id));
        if records.len() == before {
            return Ok(false);
        }
        self.save_next_id(next_id)?;
        self.save_records(&records)?;
        log::debug!("deleted transaction {id}");
        Ok(true)
    }

    fn clear_all(&mut self) -> Result<()> {
        let records = self.load_records()?;
        self.save_next_id(self.next_id(&records)?)?;
        self.save_records(&[])?;
        log::info!("cleared all transactions");
        Ok(())
    }
}

impl CategoryRegistry for JsonStore {
    fn list_categories(&self, kind: Option<TxnType>) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .load_categories()?
            .into_iter()
            .filter(|c| kind.map_or(true, |k| c.kind == k))
            .collect();
        categories.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    fn add_category(&mut self, category: &Category) -> Result<bool> {
        category.validate()?;
        let mut categories = self.load_categories()?;
        if Category::find_by_name(&categories, &category.name).is_some() {
            return Ok(false);
        }
        let mut new = category.clone();
        new.name = new.name.trim().to_string();
        new.id = None;
        categories.push(new);
        self.save_categories(&categories)?;
        log::debug!("added category '{}'", category.name);
        Ok(true)
    }

    fn delete_category(&mut self, name: &str) -> Result<bool> {
        let mut categories = self.load_categories()?;
        let before = categories.len();
        categories.retain(|c| !c.same_name(name));
        if categories.len() == before {
            return Ok(false);
        }
        self.save_categories(&categories)?;
        log::debug!("deleted category '{name}'");
        Ok(true)
    }
}

#[cfg(test)]
mod tests;
