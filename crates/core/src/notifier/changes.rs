use crate::domain::stock::ScoredSnapshot;

/// Tickers currently priced below their opt-in price, in slate order.
pub fn filter_green_prices(scored: &[ScoredSnapshot]) -> Vec<String> {
    scored
        .iter()
        .filter(|s| s.is_green_priced())
        .map(|s| s.ticker.clone())
        .collect()
}

/// Returns `(removed, added)` between the stored baseline and the current set.
///
/// When either side is empty the inputs are returned as-is: everything
/// previous was removed, everything current was added.
pub fn diff_recommendations(previous: &[String], current: &[String]) -> (Vec<String>, Vec<String>) {
    if previous.is_empty() || current.is_empty() {
        return (previous.to_vec(), current.to_vec());
    }

    let removed = previous
        .iter()
        .filter(|symbol| !current.contains(symbol))
        .cloned()
        .collect();

    let added = current
        .iter()
        .filter(|symbol| !previous.contains(symbol))
        .cloned()
        .collect();

    (removed, added)
}
