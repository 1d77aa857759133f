use anyhow::Context;
use chrono::{NaiveDate, Utc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crpt_client::config::Config;
use crpt_client::document::DOC_TYPE_INTRODUCE_GOODS;
use crpt_client::{CrptClient, Document, Product, Signature};

fn sample_document() -> anyhow::Result<Document> {
    let day = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d");

    let products = vec![
        Product::new("770123456789", "770987654321", day("2023-07-27")?, "1234567890")
            .with_certificate("CONFORMITY_CERTIFICATE", day("2023-07-27")?, "123")
            .with_uit("uit123456")
            .with_uitu("uitu123456"),
        Product::new("770123456789", "770987654321", day("2023-07-28")?, "0987654321")
            .with_certificate("CONFORMITY_DECLARATION", day("2023-07-28")?, "456")
            .with_uit("uit654321")
            .with_uitu("uitu654321"),
    ];

    let document = Document::new(
        uuid::Uuid::new_v4().to_string(),
        "IN_PROGRESS",
        DOC_TYPE_INTRODUCE_GOODS,
        "770123456789",
        "770123456789",
        "770987654321",
        day("2023-07-27")?,
        "OWN_PRODUCTION",
        products,
        Utc::now().date_naive(),
    )
    .with_import_request(false)
    .with_reg_number(format!("REG-{}", Utc::now().timestamp_millis()));

    Ok(document)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    // Initialize logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "Rate limit: {} requests per {:?} against {}",
        config.request_limit,
        config.window(),
        config.api_url
    );

    let client = CrptClient::new(&config)?;

    let signature = std::env::var("CRPT_SIGNATURE").unwrap_or_else(|_| "signature_base64".to_string());
    let document = sample_document()?;

    match client.create_document(document, Signature::new(signature)).await {
        Ok(response) => info!("Registered: HTTP {} {}", response.status, response.body),
        Err(e) => error!("{}", e),
    }

    client.shutdown().await;
    Ok(())
}
