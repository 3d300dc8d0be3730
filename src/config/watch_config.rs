use crate::core::engine::RunSettings;
use crate::core::{CabinClass, Criteria, DateWindow, Mailbox, Route};
use crate::utils::error::{Result, WatchError};
use crate::utils::validation::{
    validate_email, validate_iata_code, validate_non_empty_string, validate_price, validate_range,
    validate_url, Validate,
};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_TITLE: &str = "NZ→AU premium fares";

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_routes() -> Vec<String> {
    vec![
        "AKL:SYD".to_string(),
        "AKL:MEL".to_string(),
        "AKL:BNE".to_string(),
    ]
}

fn default_cabins() -> Vec<CabinClass> {
    vec![CabinClass::PremiumEconomy, CabinClass::Business]
}

fn default_currency() -> String {
    "NZD".to_string()
}

fn default_max_price() -> f64 {
    1500.0
}

fn default_months_ahead() -> u32 {
    3
}

fn default_step_days() -> u32 {
    10
}

fn default_fares_base_url() -> String {
    "https://test.api.amadeus.com".to_string()
}

fn default_email_base_url() -> String {
    "https://api.brevo.com".to_string()
}

fn default_timeout() -> u64 {
    20
}

fn default_max_results() -> u32 {
    50
}

fn default_request_interval() -> u64 {
    250
}

fn default_booking_url() -> String {
    "https://www.grabaseat.co.nz/".to_string()
}

fn default_sender_name() -> String {
    "NZ AU Fare Bot".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub report_dir: Option<String>,
    pub search: SearchConfig,
    pub fares: FareApiConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// `ORIGIN:DESTINATION` pairs.
    #[serde(default = "default_routes")]
    pub routes: Vec<String>,
    #[serde(default = "default_cabins")]
    pub cabins: Vec<CabinClass>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_max_price")]
    pub max_price: f64,
    #[serde(default)]
    pub cabin_caps: BTreeMap<CabinClass, f64>,
    /// Defaults to the day of the run.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Defaults to `start_date` plus `months_ahead`.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_months_ahead")]
    pub months_ahead: u32,
    #[serde(default = "default_step_days")]
    pub step_days: u32,
    #[serde(default)]
    pub stay_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareApiConfig {
    #[serde(default = "default_fares_base_url")]
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default)]
    pub non_stop: bool,
    /// Two-letter carrier codes; empty means any airline.
    #[serde(default)]
    pub airlines: Vec<String>,
    #[serde(default = "default_request_interval")]
    pub request_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_email_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub sender_email: String,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    pub recipient_email: String,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Link shown next to each fare. May contain `{origin}`, `{destination}`,
    /// `{departure}`, `{return}` and `{cabin}`; empty drops the column.
    #[serde(default = "default_booking_url")]
    pub booking_url: String,
}

impl EmailConfig {
    pub fn sender(&self) -> Mailbox {
        Mailbox {
            email: self.sender_email.clone(),
            name: Some(self.sender_name.clone()),
        }
    }

    pub fn recipient(&self) -> Mailbox {
        Mailbox {
            email: self.recipient_email.clone(),
            name: self.recipient_name.clone(),
        }
    }
}

fn lookup_var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_var<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup_var(lookup, key).ok_or_else(|| WatchError::MissingConfigError {
        field: key.to_string(),
    })
}

fn parsed_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup_var(lookup, key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| WatchError::InvalidConfigValueError {
                    field: key.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}

fn bool_var<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup_var(lookup, key) {
        None => Ok(default),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "on" => Ok(true),
            "0" | "false" | "no" | "n" | "off" => Ok(false),
            _ => Err(WatchError::InvalidConfigValueError {
                field: key.to_string(),
                value: raw,
                reason: "Expected a boolean such as 1/0 or true/false".to_string(),
            }),
        },
    }
}

fn list_var<F>(lookup: &F, key: &str) -> Option<Vec<String>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup_var(lookup, key).map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
}

/// Placeholders left by `substitute_env_vars` mean the variable was unset.
fn validate_resolved(field_name: &str, value: &str) -> Result<()> {
    if let Some(start) = value.find("${") {
        let name = value[start + 2..]
            .split('}')
            .next()
            .unwrap_or(field_name)
            .to_string();
        return Err(WatchError::MissingConfigError { field: name });
    }
    validate_non_empty_string(field_name, value)
}

impl WatchConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WatchError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| WatchError::config(format!("TOML parsing error: {}", e)))
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| WatchError::config(format!("placeholder pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `KEY=value` settings such as the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = &lookup;

        let cabins = match list_var(lookup, "CABINS") {
            Some(raw) => raw
                .iter()
                .map(|c| {
                    c.parse::<CabinClass>()
                        .map_err(|reason| WatchError::InvalidConfigValueError {
                            field: "CABINS".to_string(),
                            value: c.clone(),
                            reason,
                        })
                })
                .collect::<Result<Vec<_>>>()?,
            None => default_cabins(),
        };

        let mut cabin_caps = BTreeMap::new();
        if let Some(cap) = parsed_var::<_, f64>(lookup, "PE_CAP")? {
            cabin_caps.insert(CabinClass::PremiumEconomy, cap);
        }
        if let Some(cap) = parsed_var::<_, f64>(lookup, "J_CAP")? {
            cabin_caps.insert(CabinClass::Business, cap);
        }

        let search = SearchConfig {
            routes: list_var(lookup, "ROUTES").unwrap_or_else(default_routes),
            cabins,
            currency: lookup_var(lookup, "CURRENCY").unwrap_or_else(default_currency),
            max_price: parsed_var(lookup, "MAX_PRICE")?.unwrap_or_else(default_max_price),
            cabin_caps,
            start_date: parsed_var(lookup, "START_DATE")?,
            end_date: parsed_var(lookup, "END_DATE")?,
            months_ahead: parsed_var(lookup, "SCAN_MONTHS")?.unwrap_or_else(default_months_ahead),
            step_days: parsed_var(lookup, "DATE_STEP_DAYS")?.unwrap_or_else(default_step_days),
            stay_days: parsed_var(lookup, "STAY_DAYS")?,
        };

        let timeout_seconds =
            parsed_var(lookup, "HTTP_TIMEOUT_SECS")?.unwrap_or_else(default_timeout);

        let fares = FareApiConfig {
            base_url: lookup_var(lookup, "AMADEUS_BASE_URL")
                .unwrap_or_else(default_fares_base_url),
            client_id: required_var(lookup, "AMADEUS_CLIENT_ID")?,
            client_secret: required_var(lookup, "AMADEUS_CLIENT_SECRET")?,
            timeout_seconds,
            max_results: parsed_var(lookup, "MAX_RESULTS")?.unwrap_or_else(default_max_results),
            non_stop: bool_var(lookup, "NON_STOP", false)?,
            airlines: list_var(lookup, "AIRLINES").unwrap_or_default(),
            request_interval_ms: parsed_var(lookup, "RATE_LIMIT_MS")?
                .unwrap_or_else(default_request_interval),
        };

        let email = EmailConfig {
            base_url: lookup_var(lookup, "BREVO_BASE_URL").unwrap_or_else(default_email_base_url),
            api_key: lookup_var(lookup, "BREVO_API_KEY").unwrap_or_default(),
            sender_email: lookup_var(lookup, "FROM_EMAIL").unwrap_or_default(),
            sender_name: lookup_var(lookup, "FROM_NAME").unwrap_or_else(default_sender_name),
            recipient_email: required_var(lookup, "TO_EMAIL")?,
            recipient_name: lookup_var(lookup, "TO_NAME"),
            timeout_seconds,
            booking_url: lookup_var(lookup, "BOOKING_URL").unwrap_or_else(default_booking_url),
        };

        Ok(Self {
            title: lookup_var(lookup, "TITLE").unwrap_or_else(default_title),
            dry_run: bool_var(lookup, "DRY_RUN", false)?,
            report_dir: lookup_var(lookup, "REPORT_DIR"),
            search,
            fares,
            email,
        })
    }

    pub fn routes(&self) -> Result<Vec<Route>> {
        self.search
            .routes
            .iter()
            .map(|raw| {
                raw.parse::<Route>()
                    .map_err(|reason| WatchError::InvalidConfigValueError {
                        field: "search.routes".to_string(),
                        value: raw.clone(),
                        reason,
                    })
            })
            .collect()
    }

    /// The filter for a run that starts on `today`.
    pub fn criteria(&self, today: NaiveDate) -> Result<Criteria> {
        let start = self.search.start_date.unwrap_or(today);
        let end = match self.search.end_date {
            Some(end) => end,
            None => start
                .checked_add_months(Months::new(self.search.months_ahead))
                .ok_or_else(|| WatchError::config("search window end is out of range"))?,
        };

        Ok(Criteria {
            cabins: self.search.cabins.iter().copied().collect(),
            max_price: self.search.max_price,
            cabin_caps: self.search.cabin_caps.clone(),
            currency: self.search.currency.clone(),
            routes: self.routes()?,
            window: DateWindow {
                start,
                end,
                step_days: self.search.step_days,
                stay_days: self.search.stay_days,
            },
        })
    }

    pub fn run_settings(&self, today: NaiveDate) -> Result<RunSettings> {
        Ok(RunSettings {
            criteria: self.criteria(today)?,
            recipient: self.email.recipient(),
            title: self.title.clone(),
            booking_url: Some(self.email.booking_url.trim())
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            dry_run: self.dry_run,
        })
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("title", &self.title)?;
        if let Some(dir) = &self.report_dir {
            validate_non_empty_string("report_dir", dir)?;
        }

        // fares
        validate_url("fares.base_url", &self.fares.base_url)?;
        validate_resolved("fares.client_id", &self.fares.client_id)?;
        validate_resolved("fares.client_secret", &self.fares.client_secret)?;
        validate_range("fares.timeout_seconds", self.fares.timeout_seconds, 1, 120)?;
        validate_range("fares.max_results", self.fares.max_results, 1, 250)?;
        for airline in &self.fares.airlines {
            if airline.len() != 2 || !airline.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(WatchError::InvalidConfigValueError {
                    field: "fares.airlines".to_string(),
                    value: airline.clone(),
                    reason: "Expected a two-character carrier code such as NZ".to_string(),
                });
            }
        }

        // search
        if self.search.routes.is_empty() {
            return Err(WatchError::MissingConfigError {
                field: "search.routes".to_string(),
            });
        }
        for route in self.routes()? {
            validate_iata_code("search.routes", &route.origin)?;
            validate_iata_code("search.routes", &route.destination)?;
            if route.origin == route.destination {
                return Err(WatchError::InvalidConfigValueError {
                    field: "search.routes".to_string(),
                    value: route.to_string(),
                    reason: "Origin and destination are the same".to_string(),
                });
            }
        }
        if self.search.cabins.is_empty() {
            return Err(WatchError::MissingConfigError {
                field: "search.cabins".to_string(),
            });
        }
        let currency = &self.search.currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(WatchError::InvalidConfigValueError {
                field: "search.currency".to_string(),
                value: currency.clone(),
                reason: "Expected an ISO 4217 code such as NZD".to_string(),
            });
        }
        validate_price("search.max_price", self.search.max_price, 1.0, 1_000_000.0)?;
        for (cabin, cap) in &self.search.cabin_caps {
            let field = format!("search.cabin_caps.{}", cabin.provider_code());
            validate_price(&field, *cap, 1.0, 1_000_000.0)?;
        }
        validate_range("search.months_ahead", self.search.months_ahead, 1, 12)?;
        validate_range("search.step_days", self.search.step_days, 1, 90)?;
        if let Some(stay) = self.search.stay_days {
            validate_range("search.stay_days", stay, 1, 60)?;
        }
        if let (Some(start), Some(end)) = (self.search.start_date, self.search.end_date) {
            if end < start {
                return Err(WatchError::InvalidConfigValueError {
                    field: "search.end_date".to_string(),
                    value: end.to_string(),
                    reason: format!("End date is before start date {}", start),
                });
            }
        }

        // email
        validate_url("email.base_url", &self.email.base_url)?;
        validate_email("email.recipient_email", &self.email.recipient_email)?;
        validate_range("email.timeout_seconds", self.email.timeout_seconds, 1, 120)?;
        if !self.email.booking_url.trim().is_empty() {
            validate_url("email.booking_url", self.email.booking_url.trim())?;
        }
        if !self.dry_run {
            validate_resolved("email.api_key", &self.email.api_key)?;
            validate_email("email.sender_email", &self.email.sender_email)?;
        }

        Ok(())
    }
}

impl Validate for WatchConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
