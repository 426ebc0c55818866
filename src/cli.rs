use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use tally::aggregate;
use tally::export;
use tally::models::{parse_date, parse_month, Category, Record, TxnType};
use tally::store::{load_sample_data, CategoryRegistry, Ledger, Store};

pub(crate) fn run(args: &[String], ledger: &mut dyn Ledger) -> Result<()> {
    let Some(command) = args.get(1) else {
        print_usage();
        return Ok(());
    };
    let rest = &args[2..];
    match command.as_str() {
        "add" | "a" => cli_add(rest, ledger),
        "list" | "ls" => cli_list(rest, ledger),
        "update" => cli_update(rest, ledger),
        "delete" | "rm" => cli_delete(rest, ledger),
        "clear" => cli_clear(rest, ledger),
        "summary" | "s" => cli_summary(rest, ledger),
        "categories" => cli_categories(rest, ledger),
        "category" => cli_category(rest, ledger),
        "export" => cli_export(rest, ledger),
        "import" => cli_import(rest, ledger),
        "sample" => {
            let n = load_sample_data(ledger)?;
            println!("Loaded {n} sample transactions");
            Ok(())
        }
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("tally {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("tally: local-only income and expense ledger");
    println!();
    println!("Usage: tally <command>");
    println!();
    println!("Commands:");
    println!("  add <type> <category> <amount> <description...>   Record a transaction");
    println!("    --date <YYYY-MM-DD>         Date (default: today)");
    println!("  list                          List transactions, newest first");
    println!("    --month <YYYY-MM>           Only one month");
    println!("  update <id> <type> <category> <amount> <description...>");
    println!("    --date <YYYY-MM-DD>         New date (default: keep)");
    println!("  delete <id>                   Delete a transaction");
    println!("  clear --yes                   Delete ALL transactions");
    println!("  summary [YYYY-MM]             Totals, by category and by month");
    println!("  categories [expense|income]   List categories");
    println!("  category add <name> <type>    Add a category");
    println!("    --color <#RRGGBB>  --icon <text>");
    println!("  category delete <name>        Delete a category");
    println!("  export [path]                 Export all transactions to CSV");
    println!("  import <file.csv>             Import transactions from an export");
    println!("  sample                        Load demonstration data");
    println!();
    println!("Environment: TALLY_DATA_DIR, TALLY_BACKEND (sqlite|json), RUST_LOG");
}

/// Value following `flag`, if present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn parse_amount(s: &str) -> Result<Decimal> {
    Decimal::from_str(s.trim()).with_context(|| format!("'{s}' is not a valid amount"))
}

fn parse_id(s: Option<&&str>) -> Result<i64> {
    let s = s.ok_or_else(|| anyhow::anyhow!("Missing transaction id"))?;
    s.parse().with_context(|| format!("'{s}' is not a valid id"))
}

/// The registry is advisory: unknown names are refused here, at the input boundary.
/// Returns the registered entry so records carry its canonical spelling.
fn check_category(ledger: &dyn Ledger, name: &str, kind: TxnType) -> Result<Category> {
    let categories = ledger.list_categories(Some(kind))?;
    if let Some(found) = Category::find_by_name(&categories, name) {
        return Ok(found.clone());
    }
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    anyhow::bail!(
        "Unknown {kind} category '{name}'. Known: {}",
        names.join(", ")
    );
}

/// `<type> <category> <amount> <description...>`
fn record_from_args(pos: &[&str], ledger: &dyn Ledger, date: NaiveDate) -> Result<Record> {
    if pos.len() < 4 {
        anyhow::bail!("Expected: <type> <category> <amount> <description...>");
    }
    let kind = TxnType::parse(pos[0])?;
    let category = check_category(ledger, pos[1], kind)?;
    let amount = parse_amount(pos[2])?;
    let description = pos[3..].join(" ");
    Ok(Record::new(date, category.name, description, amount, kind))
}

fn cli_add(args: &[String], ledger: &mut dyn Ledger) -> Result<()> {
    let date = match flag_value(args, "--date") {
        Some(d) => parse_date(d)?,
        None => chrono::Local::now().date_naive(),
    };
    let record = record_from_args(&positional(args), ledger, date)?;
    let id = ledger.add(&record)?;
    println!(
        "Saved transaction #{id}: {} {:.2} in {}",
        record.kind, record.amount, record.category
    );
    Ok(())
}

fn cli_list(args: &[String], ledger: &mut dyn Ledger) -> Result<()> {
    let mut records = ledger.get_all()?;
    if let Some(m) = flag_value(args, "--month") {
        records = aggregate::in_month(&records, &parse_month(m)?);
    }
    if records.is_empty() {
        println!("No transactions");
        return Ok(());
    }

    println!(
        "{:<5} {:<10} {:<8} {:<20} {:<30} {:>12}",
        "ID", "Date", "Type", "Category", "Description", "Amount"
    );
    println!("{}", "─".repeat(90));
    for r in &records {
        println!(
            "{:<5} {:<10} {:<8} {:<20} {:<30} {:>12.2}",
            r.id.unwrap_or(0),
            r.date.to_string(),
            r.kind.as_str(),
            truncate(&r.category, 20),
            truncate(&r.description, 30),
            r.signed_amount(),
        );
    }
    Ok(())
}

fn cli_update(args: &[String], ledger: &mut dyn Ledger) -> Result<()> {
    let pos = positional(args);
    let id = parse_id(pos.first())?;
    let Some(existing) = ledger.get(id)? else {
        anyhow::bail!("Transaction #{id} not found");
    };
    let date = match flag_value(args, "--date") {
        Some(d) => parse_date(d)?,
        None => existing.date,
    };
    let record = record_from_args(&pos[1..], ledger, date)?;
    if ledger.update(id, &record)? {
        println!("Updated transaction #{id}");
    } else {
        println!("Transaction #{id} not found");
    }
    Ok(())
}

fn cli_delete(args: &[String], ledger: &mut dyn Ledger) -> Result<()> {
    let pos = positional(args);
    let id = parse_id(pos.first())?;
    if ledger.delete(id)? {
        println!("Deleted transaction #{id}");
    } else {
        println!("Transaction #{id} not found");
    }
    Ok(())
}

fn cli_clear(args: &[String], ledger: &mut dyn Ledger) -> Result<()> {
    if !args.iter().any(|a| a == "--yes") {
        anyhow::bail!("This deletes ALL transactions and cannot be undone. Re-run with --yes");
    }
    ledger.clear_all()?;
    println!("All transactions deleted");
    Ok(())
}

fn cli_summary(args: &[String], ledger: &mut dyn Ledger) -> Result<()> {
    let all = ledger.get_all()?;
    let (title, records) = match args.first().filter(|a| !a.starts_with('-')) {
        Some(m) => {
            let month = parse_month(m)?;
            let records = aggregate::in_month(&all, &month);
            (month, records)
        }
        None => ("All time".to_string(), all),
    };

    let s = aggregate::summary(&records);
    println!("tally: {title}");
    println!("{}", "─".repeat(40));
    println!("  Income:     {:.2}", s.total_income);
    println!("  Expenses:   {:.2}", s.total_expenses);
    println!("  Balance:    {:.2}", s.balance);
    println!("  Total Txns: {}", records.len());

    let by_category = aggregate::by_category(&records);
    if !by_category.is_empty() {
        println!();
        println!("By Category:");
        for c in &by_category {
            println!(
                "  {:<8} {:<24} {:>12.2}  ({} txns)",
                c.kind.as_str(),
                c.category,
                c.total,
                c.count
            );
        }
    }

    let shares = aggregate::expense_shares(&records);
    if !shares.is_empty() {
        println!();
        println!("Expense Distribution:");
        for (name, pct) in &shares {
            println!("  {name:<24} {pct:>6.2}%");
        }
    }

    let by_month = aggregate::by_month(&records);
    if !by_month.is_empty() {
        println!();
        println!("By Month:");
        for m in &by_month {
            println!("  {} {:<8} {:>12.2}", m.month, m.kind.as_str(), m.total);
        }
    }
    Ok(())
}

fn cli_categories(args: &[String], ledger: &mut dyn Ledger) -> Result<()> {
    let kind = args.first().map(|s| TxnType::parse(s)).transpose()?;
    let categories = ledger.list_categories(kind)?;
    if categories.is_empty() {
        println!("No categories");
        return Ok(());
    }
    println!("{:<8} {:<24} {:<8} Icon", "Type", "Name", "Color");
    println!("{}", "─".repeat(50));
    for c in &categories {
        println!(
            "{:<8} {:<24} {:<8} {}",
            c.kind.as_str(),
            c.name,
            c.color.as_deref().unwrap_or(""),
            c.icon.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

fn cli_category(args: &[String], ledger: &mut dyn Ledger) -> Result<()> {
    let pos = positional(args);
    match pos.first().copied() {
        Some("add") => {
            let (Some(name), Some(kind)) = (pos.get(1), pos.get(2)) else {
                anyhow::bail!("Usage: tally category add <name> <expense|income> [--color #RRGGBB] [--icon X]");
            };
            let mut category = Category::new(*name, TxnType::parse(kind)?);
            if let Some(color) = flag_value(args, "--color") {
                category = category.with_color(color);
            }
            if let Some(icon) = flag_value(args, "--icon") {
                category = category.with_icon(icon);
            }
            if ledger.add_category(&category)? {
                println!("Category '{}' added", category.name);
            } else {
                anyhow::bail!("Category '{}' already exists", category.name);
            }
        }
        Some("delete") | Some("rm") => {
            let Some(name) = pos.get(1) else {
                anyhow::bail!("Usage: tally category delete <name>");
            };
            if ledger.delete_category(name)? {
                println!("Category '{name}' deleted");
            } else {
                println!("Category '{name}' not found");
            }
        }
        _ => anyhow::bail!("Usage: tally category <add|delete> ..."),
    }
    Ok(())
}

fn cli_export(args: &[String], ledger: &mut dyn Ledger) -> Result<()> {
    let records = ledger.get_all()?;
    if records.is_empty() {
        println!("No transactions to export");
        return Ok(());
    }
    let output_path = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            let today = chrono::Local::now().format("%Y-%m-%d");
            format!("{home}/expenses_{today}.csv")
        });

    let text = export::to_delimited_text(&records)?;
    std::fs::write(&output_path, text)
        .with_context(|| format!("Failed to write {output_path}"))?;
    println!("Exported {} transactions to {output_path}", records.len());
    Ok(())
}

fn cli_import(args: &[String], ledger: &mut dyn Ledger) -> Result<()> {
    let Some(file_path) = args.first() else {
        anyhow::bail!("Usage: tally import <file.csv>");
    };
    let path = shellexpand(file_path);
    let text = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {path}"))?;
    let records = export::from_delimited_text(&text)?;
    println!("Parsed {} transactions", records.len());
    for record in &records {
        ledger.add(record)?;
    }
    println!("Imported {} transactions", records.len());
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
