use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeRatioBand {
    pub avg: f64,
    pub min: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendYieldBand {
    pub avg: f64,
    pub max: f64,
}

/// Current quote plus five-year ratio history for one ticker, as served by the
/// stock screener.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerSnapshot {
    pub ticker: String,
    pub price: f64,
    pub eps: f64,
    /// Dividend per single payment, not annualized.
    pub dividend: f64,
    pub pe_ratio_5yr: PeRatioBand,
    pub dividend_yield_5yr: DividendYieldBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceColor {
    Green,
    Yellow,
    Red,
}

/// Traffic light for dividend yield and P/E, where "not attractive" is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalColor {
    Green,
    Yellow,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredSnapshot {
    pub ticker: String,
    pub price: f64,
    pub opt_in_price: f64,
    pub price_color: PriceColor,
    #[serde(rename = "dividend")]
    pub annual_dividend: f64,
    pub dividend_yield: f64,
    pub opt_in_yield: f64,
    pub dividend_color: SignalColor,
    pub current_pe: f64,
    pub opt_in_pe: f64,
    #[serde(rename = "pecolor")]
    pub pe_color: SignalColor,
}

impl ScoredSnapshot {
    pub fn is_green_priced(&self) -> bool {
        self.price_color == PriceColor::Green
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_screener_payload() {
        let v = json!({
            "ticker": "INTC",
            "price": 49.28,
            "eps": 5.43,
            "dividend": 0.33,
            "peRatio5yr": {"avg": 14.89, "min": 8.79},
            "dividendYield5yr": {"avg": 2.62, "max": 3.65}
        });

        let parsed: TickerSnapshot = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.ticker, "INTC");
        assert_eq!(parsed.pe_ratio_5yr.min, 8.79);
        assert_eq!(parsed.dividend_yield_5yr.max, 3.65);
    }

    #[test]
    fn scored_snapshot_uses_wire_names() {
        let scored = ScoredSnapshot {
            ticker: "INTC".to_string(),
            price: 49.28,
            opt_in_price: 37.7,
            price_color: PriceColor::Red,
            annual_dividend: 1.32,
            dividend_yield: 2.68,
            opt_in_yield: 3.5,
            dividend_color: SignalColor::Yellow,
            current_pe: 9.07,
            opt_in_pe: 11.84,
            pe_color: SignalColor::Green,
        };

        let v = serde_json::to_value(&scored).unwrap();
        assert_eq!(v["dividend"], json!(1.32));
        assert_eq!(v["priceColor"], json!("red"));
        assert_eq!(v["dividendColor"], json!("yellow"));
        assert_eq!(v["pecolor"], json!("green"));
        assert_eq!(v["optInPrice"], json!(37.7));
    }
}
