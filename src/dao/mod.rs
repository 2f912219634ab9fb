/// Provider-agnostic live feed abstraction.
pub mod feed;
/// NBA live data CDN client.
pub mod nba_cdn;
