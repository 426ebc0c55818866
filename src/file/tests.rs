#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn record(date: &str, category: &str, description: &str, amount: Decimal, kind: TxnType) -> Record {
    Record::new(parse_date(date).unwrap(), category, description, amount, kind)
}

fn open() -> (TempDir, JsonStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open(dir.path()).unwrap();
    (dir, store)
}

fn write_records_file(dir: &TempDir, body: &str) {
    fs::write(dir.path().join(RECORDS_FILE), body).unwrap();
}

#[test]
fn test_missing_file_is_empty_store() {
    let (dir, store) = open();
    assert!(store.get_all().unwrap().is_empty());
    assert!(!dir.path().join(RECORDS_FILE).exists());
}

#[test]
fn test_add_persists_immediately() {
    let (dir, mut store) = open();
    let id = store
        .add(&record("2024-01-15", "Salary", "Monthly Salary", dec!(3000), TxnType::Income))
        .unwrap();
    assert_eq!(id, 1);

    // A second handle on the same directory sees the write
    let other = JsonStore::open(dir.path()).unwrap();
    let all = other.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, Some(1));
    assert_eq!(all[0].amount, dec!(3000));
    assert!(!dir.path().join("transactions.json.tmp").exists());
}

#[test]
fn test_file_layout() {
    let (dir, mut store) = open();
    store
        .add(&record("2024-01-16", "Food & Dining", "Groceries", dec!(12.5), TxnType::Expense))
        .unwrap();
    let text = fs::read_to_string(dir.path().join(RECORDS_FILE)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let entry = &value[0];
    assert_eq!(entry["category"], "Food & Dining");
    assert_eq!(entry["description"], "Groceries");
    assert_eq!(entry["amount"].as_f64(), Some(12.5));
    assert_eq!(entry["date"], "2024-01-16");
    assert_eq!(entry["type"], "Expense");
}

#[test]
fn test_get_all_ordering() {
    let (_dir, mut store) = open();
    let a = store
        .add(&record("2024-01-16", "Food & Dining", "Groceries", dec!(150), TxnType::Expense))
        .unwrap();
    let b = store
        .add(&record("2024-01-16", "Transportation", "Gas", dec!(60), TxnType::Expense))
        .unwrap();
    let c = store
        .add(&record("2024-01-15", "Salary", "Monthly Salary", dec!(3000), TxnType::Income))
        .unwrap();
    let d = store
        .add(&record("2024-02-01", "Bills & Utilities", "Electricity", dec!(80), TxnType::Expense))
        .unwrap();
    let order: Vec<i64> = store.get_all().unwrap().iter().filter_map(|r| r.id).collect();
    assert_eq!(order, vec![d, b, a, c]);
}

#[test]
fn test_add_rejects_invalid() {
    let (dir, mut store) = open();
    let err = store
        .add(&record("2024-01-16", "Food", "Free lunch", Decimal::ZERO, TxnType::Expense))
        .unwrap_err();
    assert!(err.is_validation());
    assert!(!dir.path().join(RECORDS_FILE).exists());
}

#[test]
fn test_update_and_delete() {
    let (_dir, mut store) = open();
    let id = store
        .add(&record("2024-01-16", "Food & Dining", "Groceries", dec!(150), TxnType::Expense))
        .unwrap();

    let replacement = record("2024-01-20", "Freelance", "Web Design", dec!(500), TxnType::Income);
    assert!(store.update(id, &replacement).unwrap());
    assert!(store.get(id).unwrap().unwrap().same_entry(&replacement));
    assert!(!store.update(id + 1, &replacement).unwrap());

    assert!(store.delete(id).unwrap());
    assert!(!store.delete(id).unwrap());
    assert!(store.get_all().unwrap().is_empty());
}

#[test]
fn test_clear_all() {
    let (_dir, mut store) = open();
    crate::store::load_sample_data(&mut store).unwrap();
    assert_eq!(store.get_all().unwrap().len(), 9);
    store.clear_all().unwrap();
    assert!(store.get_all().unwrap().is_empty());
}

#[test]
fn test_legacy_entries_migrated() {
    let (dir, mut store) = open();
    write_records_file(
        &dir,
        r#"[
            {"category": "Food", "description": "Lunch", "amount": 12.5, "date": "2024-03-01"},
            {"category": "Transport", "description": "Bus", "amount": 2, "date": "2024-03-02"}
        ]"#,
    );

    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|r| r.kind == TxnType::Expense));
    assert_eq!(all[0].description, "Bus");
    assert_eq!(all[0].id, Some(2));
    assert_eq!(all[1].id, Some(1));
    assert_eq!(all[1].amount, dec!(12.5));

    // The next write stores the migrated form
    let id = store
        .add(&record("2024-03-03", "Food", "Dinner", dec!(20), TxnType::Expense))
        .unwrap();
    assert_eq!(id, 3);
    let text = fs::read_to_string(dir.path().join(RECORDS_FILE)).unwrap();
    assert!(text.contains("\"type\": \"Expense\""));
}

#[test]
fn test_ids_not_reused_after_delete() {
    let (dir, mut store) = open();
    let a = store
        .add(&record("2024-01-16", "Food & Dining", "Groceries", dec!(150), TxnType::Expense))
        .unwrap();
    let b = store
        .add(&record("2024-01-17", "Transportation", "Gas", dec!(60), TxnType::Expense))
        .unwrap();
    assert!(store.delete(b).unwrap());
    let c = store
        .add(&record("2024-01-18", "Entertainment", "Movie", dec!(35), TxnType::Expense))
        .unwrap();
    assert!(c > b && b > a);
    assert!(store.get(b).unwrap().is_none());

    store.clear_all().unwrap();
    let reopened_id = JsonStore::open(dir.path())
        .unwrap()
        .add(&record("2024-01-19", "Shopping", "Clothes", dec!(120), TxnType::Expense))
        .unwrap();
    assert!(reopened_id > c);
}

#[test]
fn test_tie_order_with_migrated_and_new_entries() {
    let (dir, mut store) = open();
    write_records_file(
        &dir,
        r#"[
            {"category": "Food", "description": "Breakfast", "amount": 4, "date": "2024-03-01"},
            {"category": "Food", "description": "Lunch", "amount": 9, "date": "2024-03-01"}
        ]"#,
    );
    store
        .add(&record("2024-03-01", "Food", "Dinner", dec!(20), TxnType::Expense))
        .unwrap();
    store
        .add(&record("2024-02-28", "Food", "Snack", dec!(2), TxnType::Expense))
        .unwrap();

    let descriptions: Vec<String> = store
        .get_all()
        .unwrap()
        .into_iter()
        .map(|r| r.description)
        .collect();
    assert_eq!(descriptions, vec!["Dinner", "Lunch", "Breakfast", "Snack"]);
}

#[test]
fn test_migrated_ids_skip_issued_ids() {
    let (dir, mut store) = open();
    let id = store
        .add(&record("2024-03-01", "Food", "Dinner", dec!(20), TxnType::Expense))
        .unwrap();
    assert!(store.delete(id).unwrap());

    // An older copy of the file dropped back in place
    write_records_file(
        &dir,
        r#"[{"category": "Food", "description": "Lunch", "amount": 9, "date": "2024-03-01"}]"#,
    );
    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].id.unwrap() > id);
}

#[test]
fn test_malformed_entries_rejected() {
    let cases = [
        r#"[{"category": "Food", "description": "Lunch", "date": "2024-03-01"}]"#,
        r#"[{"category": "Food", "description": "Lunch", "amount": 5, "date": "03/01/2024"}]"#,
        r#"[{"category": "Food", "description": "Lunch", "amount": -5, "date": "2024-03-01"}]"#,
        r#"[{"category": "", "description": "Lunch", "amount": 5, "date": "2024-03-01"}]"#,
        r#"[{"category": "Food", "description": "Lunch", "amount": 5, "date": "2024-03-01", "type": "Transfer"}]"#,
        r#"[{"id": 1, "category": "A", "description": "x", "amount": 1, "date": "2024-03-01"},
            {"id": 1, "category": "B", "description": "y", "amount": 2, "date": "2024-03-02"}]"#,
        r#"{"not": "an array"}"#,
    ];
    for body in cases {
        let (dir, store) = open();
        write_records_file(&dir, body);
        let err = store.get_all().unwrap_err();
        assert!(
            matches!(err, LedgerError::Corrupt { .. }),
            "expected corrupt error for {body}, got {err:?}"
        );
    }
}

#[test]
fn test_failed_load_does_not_touch_file() {
    let (dir, mut store) = open();
    let body = r#"[{"category": "Food", "description": "Lunch", "date": "2024-03-01"}]"#;
    write_records_file(&dir, body);
    let r = record("2024-03-03", "Food", "Dinner", dec!(20), TxnType::Expense);
    assert!(store.add(&r).unwrap_err().is_persistence());
    assert_eq!(fs::read_to_string(dir.path().join(RECORDS_FILE)).unwrap(), body);
}

// ── Categories ────────────────────────────────────────────────

#[test]
fn test_categories_seeded_once() {
    let (dir, mut store) = open();
    assert_eq!(store.list_categories(None).unwrap().len(), 12);
    for cat in store.list_categories(None).unwrap() {
        assert!(store.delete_category(&cat.name).unwrap());
    }
    let reopened = JsonStore::open(dir.path()).unwrap();
    assert!(reopened.list_categories(None).unwrap().is_empty());
}

#[test]
fn test_category_add_and_filter() {
    let (_dir, mut store) = open();
    let travel = Category::new("Travel", TxnType::Expense).with_color("#FF6B6B");
    assert!(store.add_category(&travel).unwrap());
    assert!(!store.add_category(&travel).unwrap());
    assert!(!store
        .add_category(&Category::new("SALARY", TxnType::Expense))
        .unwrap());

    let expense = store.list_categories(Some(TxnType::Expense)).unwrap();
    assert_eq!(expense.len(), 9);
    assert_eq!(expense.iter().filter(|c| c.name == "Travel").count(), 1);
    let income = store.list_categories(Some(TxnType::Income)).unwrap();
    assert!(income.iter().all(|c| c.kind == TxnType::Income));
}

#[test]
fn test_delete_category_keeps_records() {
    let (_dir, mut store) = open();
    store
        .add(&record("2024-01-16", "Shopping", "Clothes", dec!(120), TxnType::Expense))
        .unwrap();
    assert!(store.delete_category("shopping").unwrap());
    assert!(!store.delete_category("Shopping").unwrap());
    assert_eq!(store.get_all().unwrap()[0].category, "Shopping");
}
