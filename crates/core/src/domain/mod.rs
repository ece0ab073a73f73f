pub mod stock;
pub mod userprofile;
pub mod watchlist;
