use cryptoquick_sdk::{
    ChangeOrigin, CoinCache, DetailView, MemoryStorage, WatchlistStore,
};
use cryptoquick_sdk::formatters::format_price;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Two "tabs" sharing one storage: a toggle in one is seen by the other,
/// and a cached coin can still be shown when the detail fetch fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let tab_a = Arc::new(MemoryStorage::new());
    let tab_b = Arc::new(tab_a.connect());

    let watchlist_a = WatchlistStore::new(tab_a.clone());
    let watchlist_b = WatchlistStore::new(tab_b);
    let mut changes_b = watchlist_b.subscribe();

    let watching = watchlist_a.toggle("bitcoin");
    println!("Tab A toggled bitcoin -> watching: {}", watching);

    if let Some(change) = changes_b.recv().await {
        let origin = match change.origin {
            ChangeOrigin::Local => "this tab",
            ChangeOrigin::External => "another tab",
        };
        println!(
            "Tab B saw {} change from {}; watchlist is now {:?}",
            change.key,
            origin,
            watchlist_b.get()
        );
    }

    let cache = CoinCache::new(tab_a);
    let provider = cryptoquick_sdk::CoinGeckoProvider::new(&Default::default())?;
    match cryptoquick_sdk::views::load_detail("bitcoin", &provider, &cache).await {
        DetailView::Live(detail) | DetailView::Cached(detail) => {
            println!(
                "{} ({}) {}",
                detail.name,
                detail.symbol.to_uppercase(),
                format_price(detail.market_data.current_price.usd)
            );
        }
        DetailView::NotFound => println!("bitcoin not found"),
        DetailView::Failed(banner) => println!("{}: {}", banner.title, banner.message),
    }

    Ok(())
}
