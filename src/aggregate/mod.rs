//! Pure summaries over a snapshot of records.
//!
//! Nothing here touches storage. Categories are grouped by the literal
//! string on each record, so names deleted from the registry still show up.
//! All sums are `Decimal`, so many small amounts add up exactly.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::ops::Add;

use crate::models::{Record, TxnType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
}

impl Add for Summary {
    type Output = Summary;

    fn add(self, other: Summary) -> Summary {
        Summary {
            total_income: self.total_income + other.total_income,
            total_expenses: self.total_expenses + other.total_expenses,
            balance: self.balance + other.balance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub kind: TxnType,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthTotal {
    /// "YYYY-MM"
    pub month: String,
    pub kind: TxnType,
    pub total: Decimal,
    pub count: usize,
}

pub fn summary(records: &[Record]) -> Summary {
    let mut s = Summary::default();
    for r in records {
        match r.kind {
            TxnType::Income => s.total_income += r.amount,
            TxnType::Expense => s.total_expenses += r.amount,
        }
    }
    s.balance = s.total_income - s.total_expenses;
    s
}

/// Totals per (category, type): expenses first, largest total first, then by name.
pub fn by_category(records: &[Record]) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<(TxnType, &str), (Decimal, usize)> = BTreeMap::new();
    for r in records {
        let entry = groups
            .entry((r.kind, r.category.as_str()))
            .or_insert((Decimal::ZERO, 0));
        entry.0 += r.amount;
        entry.1 += 1;
    }

    let mut totals: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|((kind, category), (total, count))| CategoryTotal {
            category: category.to_string(),
            kind,
            total,
            count,
        })
        .collect();
    totals.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then(b.total.cmp(&a.total))
            .then_with(|| a.category.cmp(&b.category))
    });
    totals
}

/// Totals per (month, type), oldest month first. Empty months are absent.
pub fn by_month(records: &[Record]) -> Vec<MonthTotal> {
    let mut groups: BTreeMap<(String, TxnType), (Decimal, usize)> = BTreeMap::new();
    for r in records {
        let entry = groups
            .entry((r.month(), r.kind))
            .or_insert((Decimal::ZERO, 0));
        entry.0 += r.amount;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|((month, kind), (total, count))| MonthTotal {
            month,
            kind,
            total,
            count,
        })
        .collect()
}

/// Records dated in `month` ("YYYY-MM").
pub fn in_month(records: &[Record], month: &str) -> Vec<Record> {
    records
        .iter()
        .filter(|r| r.month() == month)
        .cloned()
        .collect()
}

/// Each expense category's share of total expenses, in percent, largest first.
pub fn expense_shares(records: &[Record]) -> Vec<(String, Decimal)> {
    let total = summary(records).total_expenses;
    if total.is_zero() {
        return Vec::new();
    }
    by_category(records)
        .into_iter()
        .filter(|c| c.kind == TxnType::Expense)
        .map(|c| (c.category, (c.total * Decimal::ONE_HUNDRED / total).round_dp(2)))
        .collect()
}
