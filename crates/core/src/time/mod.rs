pub mod us_market;
