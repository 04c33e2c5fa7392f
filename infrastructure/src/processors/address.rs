//! Address recognition over finished answers.
//!
//! Matches Chinese administrative address fragments (municipality,
//! province + city, city + district, district + street) and reports them
//! de-duplicated in first-seen order:
//!
//! ```json
//! { "has_address": true, "addresses": ["浙江省杭州市西湖区"], "original_content": "..." }
//! ```

use relay_application::{ProcessorError, ResultProcessor};
use relay_domain::ReconciledResult;
use regex::Regex;

/// Default patterns, tried in order. `\w` is Unicode-aware.
pub const DEFAULT_ADDRESS_PATTERNS: [&str; 4] = [
    r"[北上广深]\w*[市区县]",
    r"\w+省\w*[市区县]",
    r"\w+市\w*[区县]",
    r"\w+区\w*[街道路]",
];

pub struct AddressRecognitionProcessor {
    patterns: Vec<Regex>,
}

impl AddressRecognitionProcessor {
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_patterns(DEFAULT_ADDRESS_PATTERNS)
    }

    pub fn with_patterns<I, P>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// All pattern matches in `text`, de-duplicated, first-seen order.
    pub fn recognize(&self, text: &str) -> Vec<String> {
        let mut addresses: Vec<String> = Vec::new();
        for pattern in &self.patterns {
            for found in pattern.find_iter(text) {
                let found = found.as_str();
                if !addresses.iter().any(|a| a == found) {
                    addresses.push(found.to_string());
                }
            }
        }
        addresses
    }
}

impl ResultProcessor for AddressRecognitionProcessor {
    fn name(&self) -> &str {
        "address_recognition"
    }

    fn description(&self) -> &str {
        "Extracts administrative address fragments from the answer"
    }

    fn process(&self, result: &ReconciledResult) -> Result<serde_json::Value, ProcessorError> {
        let addresses = self.recognize(&result.text);
        Ok(serde_json::json!({
            "has_address": !addresses.is_empty(),
            "addresses": addresses,
            "original_content": result.text,
        }))
    }
}
