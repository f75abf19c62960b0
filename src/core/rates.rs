//! Exchange-rate snapshots and timelines

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Uniform access to the success marker carried by every provider payload.
pub trait Payload {
    fn success(&self) -> Option<bool>;
    fn error_message(&self) -> Option<&str>;

    /// `success` being absent counts as success.
    fn is_success(&self) -> bool {
        self.success() != Some(false)
    }
}

/// Snapshot of all rates for one base currency as of one date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RateSet {
    pub base: String,
    pub date: Option<NaiveDate>,
    pub rates: BTreeMap<String, f64>,
    pub success: Option<bool>,
    pub error: Option<String>,
}

impl RateSet {
    pub fn new(base: &str, date: NaiveDate, rates: BTreeMap<String, f64>) -> Self {
        Self::from_quotes(base, Some(date), rates, None)
    }

    /// Builds a successful set from provider data. Currency codes are upper-cased.
    pub fn from_quotes(
        base: &str,
        date: Option<NaiveDate>,
        rates: BTreeMap<String, f64>,
        success: Option<bool>,
    ) -> Self {
        Self {
            base: base.trim().to_uppercase(),
            date,
            rates: rates
                .into_iter()
                .map(|(code, rate)| (code.trim().to_uppercase(), rate))
                .collect(),
            success,
            error: None,
        }
    }

    /// A well-formed response that reports an application-level failure.
    pub fn failure(message: Option<String>) -> Self {
        Self {
            success: Some(false),
            error: message,
            ..Self::default()
        }
    }

    fn base_relative(&self, code: &str) -> Option<f64> {
        if code.eq_ignore_ascii_case(&self.base) {
            return Some(1.0);
        }
        self.rates.get(&code.to_uppercase()).copied()
    }

    /// Cross rate between two currencies of this set.
    pub fn rate(&self, from: &str, to: &str) -> Option<f64> {
        let from_rate = self.base_relative(from)?;
        let to_rate = self.base_relative(to)?;
        if from_rate == 0.0 {
            return None;
        }
        Some(to_rate / from_rate)
    }

    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        self.rate(from, to).map(|rate| amount * rate)
    }
}

impl Payload for RateSet {
    fn success(&self) -> Option<bool> {
        self.success
    }

    fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Cache key for a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: String,
    pub target: String,
}

impl CurrencyPair {
    pub fn new(base: &str, target: &str) -> Self {
        Self {
            base: base.trim().to_uppercase(),
            target: target.trim().to_uppercase(),
        }
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRate {
    pub date: NaiveDate,
    pub rate: f64,
}

/// Daily rates between two currencies over the trailing year.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub base: String,
    pub target: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub rates: Vec<DailyRate>,
    pub success: Option<bool>,
    pub error: Option<String>,
}

impl Timeline {
    /// Builds a timeline, sorting the points by date.
    pub fn new(pair: &CurrencyPair, mut rates: Vec<DailyRate>) -> Self {
        rates.sort_by_key(|point| point.date);
        Self {
            base: pair.base.clone(),
            target: pair.target.clone(),
            start_date: rates.first().map(|p| p.date),
            end_date: rates.last().map(|p| p.date),
            rates,
            success: None,
            error: None,
        }
    }

    pub fn failure(pair: &CurrencyPair, message: Option<String>) -> Self {
        Self {
            base: pair.base.clone(),
            target: pair.target.clone(),
            success: Some(false),
            error: message,
            ..Self::default()
        }
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.base, &self.target)
    }

    pub fn latest(&self) -> Option<DailyRate> {
        self.rates.last().copied()
    }

    pub fn min(&self) -> Option<DailyRate> {
        self.rates
            .iter()
            .copied()
            .min_by(|a, b| a.rate.total_cmp(&b.rate))
    }

    pub fn max(&self) -> Option<DailyRate> {
        self.rates
            .iter()
            .copied()
            .max_by(|a, b| a.rate.total_cmp(&b.rate))
    }

    pub fn average(&self) -> Option<f64> {
        if self.rates.is_empty() {
            return None;
        }
        let sum: f64 = self.rates.iter().map(|p| p.rate).sum();
        Some(sum / self.rates.len() as f64)
    }
}

impl Payload for Timeline {
    fn success(&self) -> Option<bool> {
        self.success
    }

    fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
