use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    /// Value of the provider's `travelClass` query parameter.
    pub fn provider_code(self) -> &'static str {
        match self {
            Self::Economy => "ECONOMY",
            Self::PremiumEconomy => "PREMIUM_ECONOMY",
            Self::Business => "BUSINESS",
            Self::First => "FIRST",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Economy => "Economy",
            Self::PremiumEconomy => "Premium Economy",
            Self::Business => "Business",
            Self::First => "First",
        }
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CabinClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "ECONOMY" | "Y" | "M" => Ok(Self::Economy),
            "PREMIUMECONOMY" | "W" => Ok(Self::PremiumEconomy),
            "BUSINESS" | "C" | "J" => Ok(Self::Business),
            "FIRST" | "F" => Ok(Self::First),
            _ => Err(format!("unknown cabin class '{}'", s)),
        }
    }
}

impl TryFrom<String> for CabinClass {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CabinClass> for String {
    fn from(cabin: CabinClass) -> Self {
        cabin.provider_code().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub origin: String,
    pub destination: String,
}

impl Route {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.origin, self.destination)
    }
}

impl FromStr for Route {
    type Err = String;

    /// Accepts `AKL:SYD` or `AKL-SYD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (origin, destination) = s
            .trim()
            .split_once([':', '-'])
            .ok_or_else(|| format!("route '{}' must look like AKL:SYD", s))?;
        Ok(Self::new(
            origin.trim().to_ascii_uppercase(),
            destination.trim().to_ascii_uppercase(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub step_days: u32,
    /// Stay length for return trips; `None` searches one-way.
    pub stay_days: Option<u32>,
}

impl DateWindow {
    /// Departure dates from `start` to `end` inclusive, `step_days` apart.
    pub fn departure_dates(&self) -> Vec<NaiveDate> {
        let step = chrono::Days::new(u64::from(self.step_days.max(1)));
        let mut dates = Vec::new();
        let mut current = self.start;
        while current <= self.end {
            dates.push(current);
            match current.checked_add_days(step) {
                Some(next) => current = next,
                None => break,
            }
        }
        dates
    }

    pub fn return_date(&self, departure: NaiveDate) -> Option<NaiveDate> {
        self.stay_days
            .and_then(|days| departure.checked_add_days(chrono::Days::new(u64::from(days))))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub cabin: CabinClass,
    pub price: f64,
    pub currency: String,
    pub airline: String,
}

/// Which offers are worth reporting. Read once at start.
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    pub cabins: BTreeSet<CabinClass>,
    pub max_price: f64,
    /// Overrides `max_price` for individual cabins.
    pub cabin_caps: BTreeMap<CabinClass, f64>,
    pub currency: String,
    pub routes: Vec<Route>,
    pub window: DateWindow,
}

impl Criteria {
    pub fn price_cap(&self, cabin: CabinClass) -> f64 {
        self.cabin_caps
            .get(&cabin)
            .copied()
            .unwrap_or(self.max_price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub recipient: Mailbox,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Nothing passed the filter; no notification was sent.
    NoMatches { fetched: usize },
    DryRun { matched: usize, subject: String },
    Notified { matched: usize },
}
