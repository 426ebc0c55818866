use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{parse_date, Category, Record, TxnType};

/// Durable collection of records. Every mutation is persisted before it returns.
pub trait Store {
    /// Validate, assign the next id, persist. Returns the new id.
    fn add(&mut self, record: &Record) -> Result<i64>;

    fn get(&self, id: i64) -> Result<Option<Record>>;

    /// Snapshot ordered by date descending, newest insert first on ties.
    fn get_all(&self) -> Result<Vec<Record>>;

    /// Replace every field except `id`. `Ok(false)` when the id is unknown.
    fn update(&mut self, id: i64, record: &Record) -> Result<bool>;

    /// Hard delete. `Ok(false)` when the id is unknown.
    fn delete(&mut self, id: i64) -> Result<bool>;

    fn clear_all(&mut self) -> Result<()>;
}

/// Allowed category names per type. Records only reference these by name.
pub trait CategoryRegistry {
    fn list_categories(&self, kind: Option<TxnType>) -> Result<Vec<Category>>;

    /// `Ok(false)` when the name is already taken by either type.
    fn add_category(&mut self, category: &Category) -> Result<bool>;

    /// `Ok(false)` when no category has that name. Records are left alone.
    fn delete_category(&mut self, name: &str) -> Result<bool>;
}

pub trait Ledger: Store + CategoryRegistry {}

impl<T: Store + CategoryRegistry> Ledger for T {}

pub(crate) const DEFAULT_CATEGORIES: &[(TxnType, &[&str])] = &[
    (
        TxnType::Expense,
        &[
            "Food & Dining",
            "Transportation",
            "Entertainment",
            "Shopping",
            "Bills & Utilities",
            "Healthcare",
            "Education",
            "Other",
        ],
    ),
    // "Other" is already taken by Expense and is skipped here
    (
        TxnType::Income,
        &["Salary", "Freelance", "Investment", "Gift", "Other"],
    ),
];

/// Default categories in seeding order, first name wins.
pub(crate) fn default_categories() -> Vec<Category> {
    let mut out: Vec<Category> = Vec::new();
    for (kind, names) in DEFAULT_CATEGORIES {
        for name in *names {
            if Category::find_by_name(&out, name).is_none() {
                out.push(Category::new(*name, *kind));
            }
        }
    }
    out
}

const SAMPLE_DATA: &[(&str, &str, &str, i64, TxnType)] = &[
    ("2024-01-15", "Salary", "Monthly Salary", 3000, TxnType::Income),
    ("2024-01-16", "Food & Dining", "Groceries", 150, TxnType::Expense),
    ("2024-01-17", "Transportation", "Gas", 60, TxnType::Expense),
    ("2024-01-18", "Entertainment", "Movie", 35, TxnType::Expense),
    ("2024-01-20", "Freelance", "Web Design", 500, TxnType::Income),
    ("2024-02-01", "Bills & Utilities", "Electricity", 80, TxnType::Expense),
    ("2024-02-05", "Salary", "Monthly Salary", 3000, TxnType::Income),
    ("2024-02-10", "Food & Dining", "Restaurant", 75, TxnType::Expense),
    ("2024-02-15", "Shopping", "Clothes", 120, TxnType::Expense),
];

/// Demonstration records spanning January and February 2024.
pub fn sample_records() -> Result<Vec<Record>> {
    SAMPLE_DATA
        .iter()
        .map(|(date, category, description, amount, kind)| {
            Ok(Record::new(
                parse_date(date)?,
                *category,
                *description,
                Decimal::from(*amount),
                *kind,
            ))
        })
        .collect()
}

/// Add the demonstration records to any store. Returns how many were added.
pub fn load_sample_data<S: Store + ?Sized>(store: &mut S) -> Result<usize> {
    let records = sample_records()?;
    for record in &records {
        store.add(record)?;
    }
    log::info!("loaded {} sample records", records.len());
    Ok(records.len())
}
