//! # Seed Data Generator
//!
//! Populates a development database with a realistic workshop scenario:
//! a vehicle, a repair job, labor, a full parts procurement chain, a
//! subcontracted service, and a generated invoice.
//!
//! ## Usage
//! ```bash
//! cargo run -p garage-db --bin seed
//!
//! # Specify database path
//! cargo run -p garage-db --bin seed -- --db ./data/garage.db
//! ```

use std::env;

use chrono::Utc;
use garage_core::{InvoiceType, JobType, Money, Rate, WorkType};
use garage_db::repository::job::NewJob;
use garage_db::repository::labor::NewLaborCharge;
use garage_db::repository::procurement::{
    NewQuotation, NewQuotationItem, NewSupplierInvoice, ReceivedLine,
};
use garage_db::repository::subcontract::NewSubcontractWork;
use garage_db::repository::vehicle::NewVehicle;
use garage_db::{Database, DbConfig, InvoiceRequest, InvoiceScope};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "garage_db=info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./garage_dev.db");

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
                println!("Garage Billing Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./garage_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Garage Billing Seed Data Generator");
    println!("=====================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if !db.vehicles().list().await?.is_empty() {
        println!("⚠ Database already has vehicles");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Vehicle and job
    let vehicle = db
        .vehicles()
        .create(NewVehicle {
            plate_number: "KBZ 412A".to_string(),
            make: "Isuzu".to_string(),
            model: "FRR90".to_string(),
            year: 2019,
            vin: Some("JALFRR90XK7100231".to_string()),
            owner_name: "Mwangi Transporters Ltd".to_string(),
            owner_phone: Some("+254 722 000111".to_string()),
            owner_email: None,
        })
        .await?;
    println!("✓ Vehicle {} ({})", vehicle.plate_number, vehicle.model);

    let job = db
        .jobs()
        .create(NewJob {
            vehicle_id: vehicle.id.clone(),
            description: "Engine overhaul and injector replacement".to_string(),
            job_type: JobType::General,
            started_on: Utc::now().date_naive(),
        })
        .await?;
    println!("✓ Job {} opened", job.job_number);

    // Labor
    db.labor()
        .create(NewLaborCharge {
            job_id: job.id.clone(),
            description: "Engine strip-down and rebuild".to_string(),
            hours: Some(18.0),
            rate_cents: Some(150_000),
            fixed_amount_cents: None,
        })
        .await?;
    db.labor()
        .create(NewLaborCharge {
            job_id: job.id.clone(),
            description: "Diagnostics and road test".to_string(),
            hours: None,
            rate_cents: None,
            fixed_amount_cents: Some(450_000),
        })
        .await?;
    println!("✓ Labor charges recorded");

    // Procurement chain: quotation → approval → order → supplier invoice
    let quotation = db
        .procurement()
        .create_quotation(NewQuotation {
            job_id: job.id.clone(),
            supplier_name: "Isuzu East Africa Parts".to_string(),
            items: vec![
                NewQuotationItem {
                    part_number: "8-97602-915-0".to_string(),
                    description: "Fuel injector assembly".to_string(),
                    quantity: 4,
                    unit_cost_cents: 1_850_000,
                },
                NewQuotationItem {
                    part_number: "8-94391-049-0".to_string(),
                    description: "Cylinder head gasket kit".to_string(),
                    quantity: 1,
                    unit_cost_cents: 950_000,
                },
            ],
        })
        .await?;
    db.procurement().submit(&quotation.id).await?;
    db.procurement().approve(&quotation.id).await?;
    db.procurement().mark_ordered(&quotation.id).await?;
    println!("✓ Quotation approved and ordered");

    let quoted_items = db.procurement().quotation_items(&quotation.id).await?;
    let supplier_invoice = db
        .procurement()
        .record_supplier_invoice(NewSupplierInvoice {
            quotation_id: quotation.id.clone(),
            supplier_invoice_number: "IEA-2026-08841".to_string(),
            received_on: Utc::now().date_naive(),
            lines: quoted_items
                .iter()
                .map(|q| ReceivedLine {
                    quotation_item_id: q.id.clone(),
                    quantity_received: q.quantity,
                    unit_cost_cents: q.unit_cost_cents,
                })
                .collect(),
        })
        .await?;

    // Install everything so the parts become billable
    let received = db
        .procurement()
        .supplier_invoice_items(&supplier_invoice.id)
        .await?;
    for item in &received {
        db.procurement()
            .record_installation(&item.id, item.quantity_received)
            .await?;
    }
    println!("✓ Parts received and installed");

    // Subcontracted machining
    let work = db
        .subcontracts()
        .create(NewSubcontractWork {
            job_id: job.id.clone(),
            subcontractor_name: "Precision Machining Ltd".to_string(),
            description: "Crankshaft grinding and balancing".to_string(),
            work_type: WorkType::Service,
            cost_cents: 2_400_000,
        })
        .await?;
    db.subcontracts().submit(&work.id).await?;
    db.subcontracts().approve(&work.id).await?;
    db.subcontracts().dispatch(&work.id).await?;
    db.subcontracts().complete(&work.id, Some(2_550_000)).await?;
    println!("✓ Subcontract work completed");

    // Final invoice for everything billable on the job
    let (invoice, _items) = db
        .billing()
        .invoice_all_eligible(InvoiceRequest {
            scope: InvoiceScope::Job(job.id.clone()),
            invoice_type: InvoiceType::Final,
            overall_discount: Rate::from_bps(500), // 5% goodwill discount
            actor: "seed".to_string(),
        })
        .await?;
    println!(
        "✓ Invoice {} generated: total {}, profit {}",
        invoice.invoice_number,
        Money::from_cents(invoice.total_cents),
        Money::from_cents(invoice.profit_cents)
    );

    let report = db.billing().check_completion(&job.id).await?;
    println!(
        "✓ Completion check: {}",
        if report.is_completable() {
            "nothing outstanding".to_string()
        } else {
            format!("{} item(s) outstanding", report.outstanding.len())
        }
    );

    // A second open job so the UI has something in progress
    let second = db
        .jobs()
        .create(NewJob {
            vehicle_id: vehicle.id,
            description: "Brake service".to_string(),
            job_type: JobType::Service,
            started_on: Utc::now().date_naive(),
        })
        .await?;
    db.labor()
        .create(NewLaborCharge {
            job_id: second.id,
            description: "Brake pad replacement, all axles".to_string(),
            hours: Some(3.5),
            rate_cents: Some(150_000),
            fixed_amount_cents: None,
        })
        .await?;
    println!("✓ Job {} opened with unbilled labor", second.job_number);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
