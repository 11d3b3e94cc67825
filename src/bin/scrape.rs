use std::time::Duration;

use rand::Rng;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use adlens_lib::{AdLibraryClient, Credentials};

const DEFAULT_QUERY: &str = "Lelosi";

/// Randomized pause between top-level calls. Courtesy toward the remote
/// service, applied here rather than inside the client.
async fn jitter() {
    let pause = Duration::from_millis(rand::rng().random_range(0..2000));
    tokio::time::sleep(pause).await;
}

fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("adlens_lib=debug,info")),
        )
        .init();

    // Credentials come from the environment, in any supported cookie-export
    // format. Nothing is compiled in.
    let credentials = match std::env::var("ADLENS_COOKIES") {
        Ok(raw) => match Credentials::parse(&raw) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to parse ADLENS_COOKIES: {}", e);
                std::process::exit(1);
            }
        },
        Err(_) => {
            info!("ADLENS_COOKIES not set; running without a cookie bundle");
            Credentials::default()
        }
    };

    let query = std::env::var("ADLENS_QUERY").unwrap_or_else(|_| DEFAULT_QUERY.to_string());

    let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    rt.block_on(async move {
        let mut client = match AdLibraryClient::connect(&credentials).await {
            Ok(c) => c,
            Err(e) => {
                eprintln!("client setup error: {}", e);
                std::process::exit(1);
            }
        };

        let pages = match client.search_pages(&query).await {
            Ok(pages) => pages,
            Err(e) => {
                error!(error = %e, query, "Page search failed");
                return;
            }
        };
        let Some(page) = pages.first() else {
            info!(query, "No pages found");
            return;
        };
        println!("page: {} ({})", page.name, page.id);

        jitter().await;
        let ads = match client.all_page_ads(&page.id).await {
            Ok(ads) => ads,
            Err(e) => {
                error!(error = %e, page_id = %page.id, "Ad listing failed");
                return;
            }
        };
        let Some(first_ad) = ads.first() else {
            info!(page_id = %page.id, "Page has no active ads");
            return;
        };
        println!("ads: {} (first: {})", ads.len(), first_ad.id);

        jitter().await;
        match client.ad_details(&first_ad.id, &page.id).await {
            Ok(detail) => match serde_json::to_string_pretty(&detail) {
                Ok(rendered) => println!("{}", rendered),
                Err(e) => error!(error = %e, "Failed to render ad details"),
            },
            // Details being unavailable is distinct from an ad with empty
            // disclosures; report it as such.
            Err(e) => error!(error = %e, ad_id = %first_ad.id, "Ad details unavailable"),
        }
    });
}
