use crate::domain::stock::ScoredSnapshot;
use crate::domain::userprofile::UserProfile;
use std::cmp::Ordering;

/// Picks the `k` best candidates out of a scored slate.
pub trait Ranker: Send + Sync {
    fn rank(&self, slate: Vec<ScoredSnapshot>, profile: &UserProfile, k: usize)
        -> Vec<ScoredSnapshot>;
}

/// Orders by price relative to the opt-in price, most discounted first.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountRanker;

fn discount_ratio(scored: &ScoredSnapshot) -> Option<f64> {
    let ratio = scored.price / scored.opt_in_price;
    // A zero dividend yields an opt-in price of 0 and a ratio of inf or NaN.
    ratio.is_finite().then_some(ratio)
}

impl Ranker for DiscountRanker {
    fn rank(
        &self,
        mut slate: Vec<ScoredSnapshot>,
        _profile: &UserProfile,
        k: usize,
    ) -> Vec<ScoredSnapshot> {
        slate.sort_by(|a, b| {
            match (discount_ratio(a), discount_ratio(b)) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.ticker.cmp(&b.ticker))
        });
        slate.truncate(k);
        slate
    }
}
