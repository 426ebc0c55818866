#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;
use crate::store::{sample_records, Store};

#[test]
fn test_header_and_row_format() {
    let mut r = Record::new(
        parse_date("2024-01-16").unwrap(),
        "Food & Dining",
        "Groceries, weekly",
        dec!(1234.50),
        TxnType::Expense,
    );
    r.id = Some(7);
    r.created_at = "2024-01-16T10:00:00+00:00".into();

    let text = to_delimited_text(&[r]).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("id,date,category,description,amount,type,created_at")
    );
    assert_eq!(
        lines.next(),
        Some("7,2024-01-16,Food & Dining,\"Groceries, weekly\",1234.50,Expense,2024-01-16T10:00:00+00:00")
    );
    assert_eq!(lines.next(), None);
}

#[test]
fn test_empty_export_is_header_only() {
    let text = to_delimited_text(&[]).unwrap();
    assert_eq!(text.trim_end(), HEADER.join(","));
    assert!(from_delimited_text(&text).unwrap().is_empty());
}

#[test]
fn test_reimport_reproduces_records() {
    let mut original = sample_records().unwrap();
    for (i, r) in original.iter_mut().enumerate() {
        r.id = Some(i as i64 + 1);
    }
    let parsed = from_delimited_text(&to_delimited_text(&original).unwrap()).unwrap();
    assert_eq!(parsed.len(), original.len());
    for (a, b) in original.iter().zip(&parsed) {
        assert!(a.same_entry(b));
        assert_eq!(a.id, b.id);
        assert_eq!(a.created_at, b.created_at);
    }
}

#[test]
fn test_reimport_into_fresh_store_reassigns_ids() {
    let mut source = crate::db::Database::open_in_memory().unwrap();
    crate::store::load_sample_data(&mut source).unwrap();
    let text = to_delimited_text(&source.get_all().unwrap()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut target = crate::file::JsonStore::open(dir.path()).unwrap();
    target
        .add(&Record::new(
            parse_date("2023-12-31").unwrap(),
            "Gift",
            "Already here",
            dec!(1),
            TxnType::Income,
        ))
        .unwrap();
    for r in from_delimited_text(&text).unwrap() {
        target.add(&r).unwrap();
    }

    let imported: Vec<Record> = target
        .get_all()
        .unwrap()
        .into_iter()
        .filter(|r| r.description != "Already here")
        .collect();
    let originals = source.get_all().unwrap();
    assert_eq!(imported.len(), originals.len());
    for r in &originals {
        assert!(imported.iter().any(|i| i.same_entry(r)));
    }
    assert!(imported.iter().all(|r| r.id.unwrap() > 1));
}

#[test]
fn test_import_without_optional_columns() {
    let text = "date,category,description,amount,type\n\
                2024-03-01,Salary,March pay,\"$3,000.00\",income\n";
    let records = from_delimited_text(text).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].id.is_none());
    assert_eq!(records[0].amount, dec!(3000));
    assert_eq!(records[0].kind, TxnType::Income);
}

#[test]
fn test_import_rejects_bad_rows() {
    let bad_amount = "date,category,description,amount,type\n2024-03-01,Food,Lunch,abc,Expense\n";
    let err = from_delimited_text(bad_amount).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("line 2"));

    let zero = "date,category,description,amount,type\n2024-03-01,Food,Lunch,0,Expense\n";
    assert!(from_delimited_text(zero).unwrap_err().is_validation());

    let bad_type = "date,category,description,amount,type\n2024-03-01,Food,Lunch,5,Refund\n";
    assert!(from_delimited_text(bad_type).is_err());

    let missing_column = "date,category,amount,type\n2024-03-01,Food,5,Expense\n";
    assert!(matches!(
        from_delimited_text(missing_column).unwrap_err(),
        LedgerError::Csv(_)
    ));
}
