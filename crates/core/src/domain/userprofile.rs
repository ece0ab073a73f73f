use serde::{Deserialize, Serialize};

/// Expected annual return / dividend raise used when no profile is available.
pub const DEFAULT_EXPECTATION: f64 = 9.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    pub stock: String,
    pub expected_raise: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub email: String,
    pub expected_return: Option<f64>,
    pub default_expectation: Option<f64>,
    #[serde(default)]
    pub expectations: Vec<Expectation>,
}

/// Fully resolved inputs for one valuation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserExpectation {
    pub expected_raise: f64,
    pub expected_return: f64,
}

impl UserProfile {
    /// Profile used on the query path when the profile provider is unavailable.
    pub fn fallback() -> Self {
        Self {
            email: String::new(),
            expected_return: Some(DEFAULT_EXPECTATION),
            default_expectation: Some(DEFAULT_EXPECTATION),
            expectations: Vec::new(),
        }
    }

    pub fn expected_return(&self) -> f64 {
        self.expected_return.unwrap_or(DEFAULT_EXPECTATION)
    }

    /// Expected dividend raise for `symbol`: the per-stock override, then the
    /// profile default, then [`DEFAULT_EXPECTATION`].
    pub fn expectation_for(&self, symbol: &str) -> f64 {
        self.expectations
            .iter()
            .find(|e| e.stock == symbol)
            .and_then(|e| e.expected_raise)
            .or(self.default_expectation)
            .unwrap_or(DEFAULT_EXPECTATION)
    }

    pub fn resolve(&self, symbol: &str) -> UserExpectation {
        UserExpectation {
            expected_raise: self.expectation_for(symbol),
            expected_return: self.expected_return(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn per_stock_override_wins() {
        let profile = UserProfile {
            email: "alice@example.com".to_string(),
            expected_return: Some(10.0),
            default_expectation: Some(6.0),
            expectations: vec![Expectation {
                stock: "INTC".to_string(),
                expected_raise: Some(5.5),
            }],
        };

        assert_eq!(profile.expectation_for("INTC"), 5.5);
        assert_eq!(profile.expectation_for("MSFT"), 6.0);
        assert_eq!(profile.expected_return(), 10.0);
    }

    #[test]
    fn override_without_value_uses_default() {
        let profile = UserProfile {
            default_expectation: Some(7.0),
            expectations: vec![Expectation {
                stock: "T".to_string(),
                expected_raise: None,
            }],
            ..Default::default()
        };

        assert_eq!(profile.expectation_for("T"), 7.0);
    }

    #[test]
    fn empty_profile_falls_back_to_nine_percent() {
        let profile = UserProfile::default();
        let resolved = profile.resolve("KO");
        assert_eq!(resolved.expected_raise, 9.0);
        assert_eq!(resolved.expected_return, 9.0);
        assert_eq!(UserProfile::fallback().resolve("KO"), resolved);
    }

    #[test]
    fn parses_provider_payload() {
        let v = json!({
            "email": "alice@example.com",
            "expectedReturn": 9.0,
            "expectations": [{"stock": "INTC", "expectedRaise": 5.5}]
        });

        let parsed: UserProfile = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.default_expectation, None);
        assert_eq!(parsed.expectation_for("INTC"), 5.5);
    }
}
