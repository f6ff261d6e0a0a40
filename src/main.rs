use chrono::{DateTime, Utc};
use redis_sdk::{Config, RedisService, SdkError};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize)]
struct Quote {
    symbol: String,
    price_cents: u64,
    fetched_at: DateTime<Utc>,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn fetch_quote(symbol: &str) -> Result<Option<Quote>, SdkError> {
    Ok(Some(Quote {
        symbol: symbol.to_string(),
        price_cents: 184_250,
        fetched_at: Utc::now(),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::get_instance(Some(Config::from_env()?));
    init_tracing(config.is_debug());

    let service = RedisService::get_instance(Some(config)).await?;

    for _ in 0..2 {
        let item = service
            .get_or_compute(
                || "demo:quote:ETH".to_string(),
                || fetch_quote("ETH"),
                Some(30),
            )
            .await?;

        if let Some(quote) = &item.value {
            tracing::info!(
                cached = item.was_served_from_cache,
                symbol = %quote.symbol,
                price_cents = quote.price_cents,
                fetched_at = %quote.fetched_at,
                "Read-through lookup"
            );
        }

        // Let the background write land before the second lookup
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    let ttl = service.get_ttl("demo:quote:ETH").await?;
    tracing::info!(ttl, "Remaining TTL");

    let removed = service.delete_by_prefix("demo:").await?;
    tracing::info!(removed = removed.len(), "Cleaned up demo keys");

    service.disconnect().await?;
    Ok(())
}
