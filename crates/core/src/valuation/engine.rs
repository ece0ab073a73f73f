use crate::domain::stock::{PriceColor, ScoredSnapshot, SignalColor, TickerSnapshot};
use std::collections::BTreeMap;

const DEFAULT_PAYMENTS_PER_YEAR: f64 = 4.0;
const MONTHLY_PAYMENTS_PER_YEAR: f64 = 12.0;

/// Required yield is at least this multiple of the benchmark yield.
const BENCHMARK_YIELD_GUARD: f64 = 1.5;
const OPT_IN_PE_WEIGHT: f64 = 0.5;
const MIN_OPT_IN_YIELD_WEIGHT: f64 = 0.4;
const MIN_YIELD_FROM_EXPECTED_RAISE: f64 = 0.1;
/// Prices within 5% above the opt-in price are yellow.
const YELLOW_PRICE_BAND: f64 = 1.05;

// Realty Income pays monthly. Payment frequency is not part of the screener
// payload, so known exceptions are listed here.
const PAYMENT_FREQUENCY_OVERRIDES: &[(&str, f64)] = &[("O", MONTHLY_PAYMENTS_PER_YEAR)];

/// Dividend payments per year, keyed by ticker. Anything not listed pays
/// quarterly.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSchedule {
    overrides: BTreeMap<String, f64>,
}

impl Default for PaymentSchedule {
    fn default() -> Self {
        Self {
            overrides: PAYMENT_FREQUENCY_OVERRIDES
                .iter()
                .map(|(symbol, n)| (symbol.to_string(), *n))
                .collect(),
        }
    }
}

impl PaymentSchedule {
    /// Built-in overrides extended via DIVIDEND_FREQUENCY_OVERRIDES="SYMBOL:N,SYMBOL:N".
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("DIVIDEND_FREQUENCY_OVERRIDES") {
            for part in s.split(',') {
                let Some((symbol, n)) = part.trim().split_once(':') else {
                    continue;
                };
                let symbol = symbol.trim();
                match n.trim().parse::<f64>() {
                    Ok(n) if n > 0.0 && !symbol.is_empty() => {
                        out.overrides.insert(symbol.to_string(), n);
                    }
                    _ => {
                        tracing::warn!(entry = part, "ignoring invalid dividend frequency override");
                    }
                }
            }
        }

        out
    }

    pub fn with_override(mut self, symbol: &str, payments_per_year: f64) -> Self {
        self.overrides
            .insert(symbol.to_string(), payments_per_year);
        self
    }

    pub fn payments_per_year(&self, ticker: &str) -> f64 {
        self.overrides
            .get(ticker)
            .copied()
            .unwrap_or(DEFAULT_PAYMENTS_PER_YEAR)
    }
}

/// Scores one ticker against the user's expectations and the market-wide
/// benchmark yield, using the built-in payment schedule.
pub fn score(
    snapshot: &TickerSnapshot,
    expected_raise: f64,
    expected_return: f64,
    benchmark_yield: f64,
) -> ScoredSnapshot {
    score_with_schedule(
        snapshot,
        expected_raise,
        expected_return,
        benchmark_yield,
        &PaymentSchedule::default(),
    )
}

pub fn score_with_schedule(
    snapshot: &TickerSnapshot,
    expected_raise: f64,
    expected_return: f64,
    benchmark_yield: f64,
    schedule: &PaymentSchedule,
) -> ScoredSnapshot {
    let min_yield_from_raise =
        (expected_return - expected_raise).max(MIN_YIELD_FROM_EXPECTED_RAISE);

    let yields = &snapshot.dividend_yield_5yr;
    let min_opt_in_yield = (yields.max - yields.avg) * MIN_OPT_IN_YIELD_WEIGHT + yields.avg;
    let benchmark_floor = benchmark_yield * BENCHMARK_YIELD_GUARD;
    let opt_in_yield = min_opt_in_yield.max(benchmark_floor.max(min_yield_from_raise));

    let pe = &snapshot.pe_ratio_5yr;
    let opt_in_pe = (pe.avg - pe.min) * OPT_IN_PE_WEIGHT + pe.min;

    let annual_dividend = snapshot.dividend * schedule.payments_per_year(&snapshot.ticker);
    let price = snapshot.price;
    let dividend_yield = annual_dividend / price * 100.0;
    let current_pe = if snapshot.eps == 0.0 {
        f64::MAX
    } else {
        price / snapshot.eps
    };

    let opt_in_price = opt_in_price(
        annual_dividend,
        benchmark_floor,
        opt_in_yield,
        min_yield_from_raise,
    );

    ScoredSnapshot {
        ticker: snapshot.ticker.clone(),
        price,
        opt_in_price,
        price_color: price_color(price, opt_in_price),
        annual_dividend,
        dividend_yield,
        opt_in_yield,
        dividend_color: dividend_color(dividend_yield, min_opt_in_yield, yields.avg),
        current_pe,
        opt_in_pe,
        pe_color: pe_color(current_pe, opt_in_pe, pe.avg),
    }
}

/// Lowest of the prices implied by each yield floor.
fn opt_in_price(
    annual_dividend: f64,
    benchmark_floor: f64,
    opt_in_yield: f64,
    min_yield_from_raise: f64,
) -> f64 {
    let benchmark_price = annual_dividend / benchmark_floor * 100.0;
    let opt_in_yield_price = annual_dividend / opt_in_yield * 100.0;
    let expected_raise_price = annual_dividend / min_yield_from_raise * 100.0;

    benchmark_price.min(opt_in_yield_price.min(expected_raise_price))
}

fn price_color(price: f64, opt_in_price: f64) -> PriceColor {
    if price < opt_in_price {
        PriceColor::Green
    } else if price < opt_in_price * YELLOW_PRICE_BAND {
        PriceColor::Yellow
    } else {
        PriceColor::Red
    }
}

fn dividend_color(dividend_yield: f64, min_opt_in_yield: f64, avg: f64) -> SignalColor {
    if dividend_yield > min_opt_in_yield {
        SignalColor::Green
    } else if dividend_yield > avg {
        SignalColor::Yellow
    } else {
        SignalColor::Blank
    }
}

fn pe_color(current_pe: f64, opt_in_pe: f64, avg: f64) -> SignalColor {
    if current_pe < opt_in_pe {
        SignalColor::Green
    } else if current_pe < avg {
        SignalColor::Yellow
    } else {
        SignalColor::Blank
    }
}
