use cryptoquick_sdk::formatters::{format_change, format_market_cap, format_price};
use cryptoquick_sdk::views::list::{CACHED_NOTICE_MESSAGE, CACHED_NOTICE_TITLE};
use cryptoquick_sdk::{Dashboard, LoadOutcome};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("cryptoquick_sdk=info".parse()?),
        )
        .with_target(true)
        .init();

    // Set CRYPTOQUICK_STORAGE_DIR to keep the cache between runs
    let dashboard = Dashboard::global().await?;

    println!("CryptoQuick - Top 10 by Market Cap");
    println!("==================================");

    match dashboard.load_coins().await {
        LoadOutcome::Cached => {
            println!("{}: {}", CACHED_NOTICE_TITLE, CACHED_NOTICE_MESSAGE);
        }
        LoadOutcome::Failed => {
            let state = dashboard.list().snapshot().await;
            if let Some(banner) = state.error {
                eprintln!("{}: {}", banner.title, banner.message);
                if let Some(hint) = banner.retry_hint() {
                    eprintln!("{}", hint);
                }
                // Live countdown until the API lets us back in
                let countdown = banner.countdown();
                futures::pin_mut!(countdown);
                while let Some(remaining) = countdown.next().await {
                    eprintln!("  retry {}", remaining);
                }
            }
            return Ok(());
        }
        _ => {}
    }

    println!(
        "{:<5} {:<14} {:<7} {:>16} {:>10} {:>10}",
        "Rank", "Name", "Symbol", "Price", "24h", "MktCap"
    );
    println!("{}", "-".repeat(68));
    for (i, coin) in dashboard.list().visible_coins().await.iter().enumerate() {
        let star = if dashboard.watchlist().contains(&coin.id) { "*" } else { " " };
        println!(
            "{:<5} {:<14} {:<7} {:>16} {:>10} {:>10}",
            format!("{}{}", i + 1, star),
            coin.name,
            coin.symbol,
            format_price(coin.current_price),
            format_change(coin.price_change_percentage_24h),
            format_market_cap(coin.market_cap),
        );
    }

    let metrics = dashboard.metrics().await;
    println!();
    println!(
        "Requests: {} (success rate {:.0}%, p50 {:.0}ms)",
        metrics.total_requests,
        metrics.success_rate * 100.0,
        metrics.latency_p50_ms
    );

    Ok(())
}
