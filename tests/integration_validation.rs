use anyhow::{ensure, Result};
use dotenvy::dotenv;
use oxide_search_bot::config::Settings;
use oxide_search_bot::search::{GoogleSearchClient, SearchApi};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::test]
#[ignore = "Requires real credentials"]
async fn test_credentials_validation() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("Starting integration test for credentials validation...");
    let settings = Settings::new()?;
    let client = GoogleSearchClient::new(&settings);

    let results = client.search("rust programming language").await;
    ensure!(!results.is_empty(), "web search returned nothing; check GOOGLE_API_KEY and GOOGLE_SEARCH_ENGINE_ID");
    info!("Web search returned {} results", results.len());

    let urls = client.search_images("ferris crab", 1).await;
    ensure!(urls.len() == 1, "image search returned {} URLs", urls.len());

    let asset = client.fetch_image(&urls[0]).await?;
    ensure!(asset.mime_type.starts_with("image/"));
    info!("Downloaded {} bytes ({})", asset.bytes.len(), asset.mime_type);

    info!("Credentials validation test passed successfully.");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
