//! Headless view models for the list and detail pages
//!
//! Rendering is left to the host; these types hold the state a renderer needs.

pub mod banner;
pub mod detail;
pub mod list;

pub use banner::ErrorBanner;
pub use detail::{load_detail, DetailView};
pub use list::{CoinListView, ListState, LoadOutcome};
