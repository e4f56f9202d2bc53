//! # Seed Data Generator
//!
//! Populates the demo account with a small pharmacy inventory and a few
//! bills for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./medbill_dev.db with 40 items (default)
//! cargo run -p medbill-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p medbill-db --bin seed -- --count 200 --db ./data/medbill.db
//! ```
//!
//! ## Generated Items
//! - Code: `{FORM}-{NAME}-{INDEX}` (TAB, SYR, CAP, OIN, INJ)
//! - Cost 55-80% of the sale price, MRP 10% above it
//! - GST: 0%, 5%, 12% or 18%
//! - Roughly one item in eight has already expired, so the dashboard
//!   shows a non-zero expiry loss on first load

use chrono::{Duration, Local, NaiveDate};
use std::env;

use medbill_core::{Money, Page, TaxRate};
use medbill_db::repository::{ItemInput, NewBill, NewBillLine};
use medbill_db::{Database, DbConfig, DEMO_USER_ID};

/// Dosage forms and sample names
const FORMS: &[(&str, &[&str])] = &[
    ("TAB", &["Paracetamol 500", "Cetirizine 10", "Azithromycin 250", "Metformin 500", "Pantoprazole 40"]),
    ("SYR", &["Cough Relief", "Ambroxol", "Multivitamin", "Antacid Gel"]),
    ("CAP", &["Amoxicillin 500", "Omeprazole 20", "Vitamin D3", "Doxycycline 100"]),
    ("OIN", &["Povidone Iodine", "Diclofenac Gel", "Clotrimazole"]),
    ("INJ", &["Insulin Regular", "Vitamin B12", "Ondansetron"]),
];

/// GST rates in basis points
const GST_RATES: &[u32] = &[0, 500, 1200, 1800];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = String::from("./medbill_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("MedBill Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of items to generate (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./medbill_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 MedBill Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Items:    {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let today = Local::now().date_naive();
    let demo = db.users().ensure_demo_user(today).await?;
    println!("✓ Demo account: {} (id {})", demo.email, demo.id);

    let existing = db.items().list(DEMO_USER_ID, "", Page::new(None, Some(1), 1, 1)).await?.total;
    if existing > 0 {
        println!("⚠ Demo account already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    println!();
    println!("Generating items...");

    let mut created = Vec::new();
    'outer: for (form_idx, (form, names)) in FORMS.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for batch in 0..4 {
                if created.len() >= count {
                    break 'outer;
                }
                let seed = form_idx * 100 + name_idx * 10 + batch;
                let input = generate_item(form, name, batch, seed, today);

                match db.items().create(DEMO_USER_ID, &input).await {
                    Ok(item) => created.push(item),
                    Err(e) => eprintln!("Failed to insert {}: {}", input.item_code, e),
                }
            }
        }
    }
    println!("✓ Generated {} items", created.len());

    // A few bills over the last week, against items that are still in date
    let sellable: Vec<_> = created
        .iter()
        .filter(|item| item.expiry_date.map_or(true, |d| d > today) && item.quantity > 5)
        .take(6)
        .collect();

    let mut bills = 0;
    for (n, pair) in sellable.chunks(2).enumerate() {
        let bill = NewBill {
            customer_name: format!("Customer {}", n + 1),
            customer_mobile: Some(format!("98765{:05}", n)),
            bill_date: today - Duration::days(n as i64 * 2),
            lines: pair
                .iter()
                .map(|item| NewBillLine {
                    item_id: Some(item.id),
                    item_name: item.item_name.clone(),
                    quantity: 2,
                    unit_price: item.price(),
                    gst: item.gst(),
                    uom: item.uom.clone(),
                })
                .collect(),
        };
        db.bills().create(DEMO_USER_ID, &bill.price()?).await?;
        bills += 1;
    }
    println!("✓ Created {} bills", bills);

    let summary = db.ledger().summary(DEMO_USER_ID, today).await?;
    println!();
    println!("Dashboard check:");
    println!("  Revenue: {}", summary.total_revenue);
    println!("  Profit:  {}", summary.profit_amount);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one item with deterministic pseudo-random values.
fn generate_item(form: &str, name: &str, batch: usize, seed: usize, today: NaiveDate) -> ItemInput {
    let short: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).take(4).collect();
    let item_code = format!("{}-{}-{:02}", form, short.to_uppercase(), batch);

    // ₹15.00 - ₹514.00
    let price_cents = 1_500 + ((seed * 37) % 500) as i64 * 100;
    let cost_pct = 55 + (seed % 26) as i64;
    let cost_cents = price_cents * cost_pct / 100;

    // One in eight already expired
    let expiry_date = if seed % 8 == 3 {
        Some(today - Duration::days(1 + (seed % 20) as i64))
    } else {
        Some(today + Duration::days(60 + (seed % 400) as i64))
    };

    ItemInput {
        item_code,
        item_name: format!("{} (Batch {})", name, batch + 1),
        quantity: 5 + (seed % 60) as i64,
        item_price: Money::from_cents(price_cents),
        cost_price: Money::from_cents(cost_cents),
        mrp: Money::from_cents(price_cents * 110 / 100),
        gst: TaxRate::from_bps(GST_RATES[seed % GST_RATES.len()]),
        uom: if form == "SYR" { "BTL".to_string() } else { "PCS".to_string() },
        expiry_date,
    }
}
