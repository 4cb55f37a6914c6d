use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

mod models;
mod repositories;
pub mod services;
pub mod settings;
pub mod utils;

use repositories::{qr_codes::QrCodeRepository, Store};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    #[arg(short, long)]
    listen: Option<String>,
    #[arg(long, default_value = "log4rs.yaml")]
    log4rs: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    let mut settings = settings::Settings::new(&args.config).expect("Could not load config file.");
    if let Some(listen) = args.listen {
        settings.server.listen = listen;
    }

    init_logging(&args.log4rs).expect("Failed to initialize logging.");
    log::info!("Starting QR rewards service.");

    let store = Store::new(Duration::from_millis(settings.store.lock_timeout_ms));
    seed_catalog(&store, &settings.catalog).await?;

    services::start_services(store, &settings).await
}

async fn seed_catalog(store: &Store, catalog: &[settings::CatalogEntry]) -> Result<()> {
    let repository = QrCodeRepository::new(store.clone());

    for entry in catalog {
        let qr_code = repository.insert_qr_code(&entry.code, entry.active).await?;
        log::debug!(
            "Issued QR code {} worth {} points (active: {})",
            qr_code.code,
            qr_code.points,
            qr_code.is_active
        );
    }

    log::info!("Seeded {} QR codes.", catalog.len());
    Ok(())
}

fn init_logging(path: &str) -> Result<(), anyhow::Error> {
    if !Path::new("logs").exists() {
        fs::create_dir("logs")?;
    }

    match log4rs::init_file(path, Default::default()) {
        Ok(_) => {
            println!("[*] Logging initialized successfully.");
            Ok(())
        }
        Err(e) => {
            println!("[ERROR] Failed to initialize logging: {}", e);
            Err(anyhow::anyhow!("Could not initialize logging: {}", e))
        }
    }
}
