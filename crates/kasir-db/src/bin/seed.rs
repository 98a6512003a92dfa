//! # Seed Data Generator
//!
//! Populates a Kasir POS database with demo companies, operators and products.
//!
//! ## Usage
//! ```bash
//! cargo run -p kasir-db --bin seed -- --db ./kasir.db
//! ```
//!
//! ## Generated Data
//! - 3 companies (electronics shop, grocery, pharmacy)
//! - An admin and a cashier per company, plus an unbound demo admin
//! - 8 products per company, prices in cents

use std::env;

use kasir_core::{NewCompany, NewProduct, NewUser, RecordStatus, UserRole};
use kasir_db::{Database, DbConfig};

struct SeedCompany {
    name: &'static str,
    address: &'static str,
    phone: &'static str,
    email: &'static str,
    description: &'static str,
    code_prefix: &'static str,
    /// (name, price in rupiah, stock, unit)
    products: &'static [(&'static str, i64, i64, &'static str)],
}

const COMPANIES: &[SeedCompany] = &[
    SeedCompany {
        name: "Toko Elektronik Maju",
        address: "Jl. Elektronik No. 123, Jakarta",
        phone: "021-12345678",
        email: "info@elektronik-maju.com",
        description: "Toko elektronik dan gadget",
        code_prefix: "ELK",
        products: &[
            ("Smartphone Samsung Galaxy", 3_500_000, 25, "pcs"),
            ("Laptop ASUS VivoBook", 7_500_000, 10, "pcs"),
            ("Headphone Sony WH-1000XM4", 4_200_000, 15, "pcs"),
            ("Mouse Wireless Logitech", 350_000, 30, "pcs"),
            ("Keyboard Mechanical", 850_000, 20, "pcs"),
            ("Monitor LED 24 inch", 2_100_000, 12, "pcs"),
            ("Power Bank 10000mAh", 250_000, 40, "pcs"),
            ("Speaker Bluetooth JBL", 1_200_000, 18, "pcs"),
        ],
    },
    SeedCompany {
        name: "Warung Sembako Bahagia",
        address: "Jl. Raya No. 456, Bandung",
        phone: "022-87654321",
        email: "bahagia@sembako.com",
        description: "Warung kebutuhan pokok sehari-hari",
        code_prefix: "SMB",
        products: &[
            ("Beras Premium 5kg", 65_000, 50, "kg"),
            ("Minyak Goreng 2L", 28_000, 30, "botol"),
            ("Gula Pasir 1kg", 15_000, 40, "kg"),
            ("Tepung Terigu 1kg", 12_000, 35, "kg"),
            ("Kecap Manis 600ml", 18_000, 25, "botol"),
            ("Mie Instan", 3_000, 100, "pcs"),
            ("Sabun Mandi", 8_000, 60, "pcs"),
            ("Detergen 1kg", 22_000, 20, "kg"),
        ],
    },
    SeedCompany {
        name: "Apotek Sehat Sentosa",
        address: "Jl. Kesehatan No. 789, Surabaya",
        phone: "031-11223344",
        email: "apotek@sehatsentosa.com",
        description: "Apotek dan perlengkapan kesehatan",
        code_prefix: "APT",
        products: &[
            ("Paracetamol 500mg", 5_000, 100, "strip"),
            ("Vitamin C 1000mg", 25_000, 50, "botol"),
            ("Betadine 60ml", 35_000, 30, "botol"),
            ("Hansaplast 10s", 12_000, 40, "box"),
            ("Antasida Tablet", 8_000, 60, "strip"),
            ("Thermometer Digital", 85_000, 15, "pcs"),
            ("Masker Medis 50pcs", 45_000, 25, "box"),
            ("Hand Sanitizer 100ml", 18_000, 35, "botol"),
        ],
    },
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kasir_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kasir POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kasir_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    println!("Kasir POS Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.companies().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} companies", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut product_total = 0;
    let mut user_total = 0;

    for seed in COMPANIES {
        let company = db
            .companies()
            .create(&NewCompany {
                name: seed.name.to_string(),
                address: Some(seed.address.to_string()),
                phone: Some(seed.phone.to_string()),
                email: Some(seed.email.to_string()),
                description: Some(seed.description.to_string()),
                status: RecordStatus::Active,
            })
            .await?;
        println!("✓ Company {}", company.name);

        let slug = seed.name.to_lowercase().replace(' ', "");
        for (prefix, label, role) in [
            ("admin", "Admin", UserRole::Admin),
            ("kasir", "Kasir", UserRole::Cashier),
        ] {
            db.users()
                .create(&NewUser {
                    company_id: Some(company.id.clone()),
                    name: format!("{} {}", label, seed.name),
                    email: format!("{}@{}.com", prefix, slug),
                    role,
                })
                .await?;
            user_total += 1;
        }

        for (idx, (name, rupiah, stock, unit)) in seed.products.iter().enumerate() {
            let code = format!("{}-{:03}", seed.code_prefix, idx + 1);
            db.products()
                .create(&NewProduct {
                    company_id: company.id.clone(),
                    name: name.to_string(),
                    code,
                    description: None,
                    price_cents: rupiah * 100,
                    stock: *stock,
                    unit: unit.to_string(),
                    status: RecordStatus::Active,
                })
                .await?;
            product_total += 1;
        }
    }

    db.users()
        .create(&NewUser {
            company_id: None,
            name: "Demo User".to_string(),
            email: "demo@kasir.com".to_string(),
            role: UserRole::Admin,
        })
        .await?;
    user_total += 1;

    println!();
    println!(
        "✓ Seed complete: {} companies, {} users, {} products",
        COMPANIES.len(),
        user_total,
        product_total
    );

    db.close().await;
    Ok(())
}
