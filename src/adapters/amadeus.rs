//! Flight offers from the Amadeus Self-Service API.
//!
//! Every route × departure date × cabin in the criteria becomes one search
//! request, sent one after another with a short pause between them. The
//! first failure ends the search.

use crate::config::watch_config::FareApiConfig;
use crate::core::{CabinClass, Criteria, FareProvider, Offer, Route};
use crate::utils::error::{Result, WatchError};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const OFFERS_PATH: &str = "/v2/shopping/flight-offers";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlightOffersResponse {
    #[serde(default)]
    data: Vec<FlightOfferDto>,
    #[serde(default)]
    dictionaries: Option<Dictionaries>,
}

#[derive(Debug, Default, Deserialize)]
struct Dictionaries {
    #[serde(default)]
    carriers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlightOfferDto {
    price: PriceDto,
    #[serde(default)]
    itineraries: Vec<ItineraryDto>,
    #[serde(default)]
    traveler_pricings: Vec<TravelerPricingDto>,
    #[serde(default)]
    validating_airline_codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceDto {
    currency: String,
    grand_total: String,
}

#[derive(Debug, Deserialize)]
struct ItineraryDto {
    #[serde(default)]
    segments: Vec<SegmentDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SegmentDto {
    departure: SegmentEndpointDto,
    carrier_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SegmentEndpointDto {
    at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TravelerPricingDto {
    #[serde(default)]
    fare_details_by_segment: Vec<FareDetailDto>,
}

#[derive(Debug, Deserialize)]
struct FareDetailDto {
    cabin: Option<String>,
}

/// One search request's worth of parameters.
struct SearchRequest<'a> {
    route: &'a Route,
    departure: NaiveDate,
    return_date: Option<NaiveDate>,
    cabin: CabinClass,
    currency: &'a str,
}

pub struct AmadeusClient {
    config: FareApiConfig,
    client: Client,
}

impl AmadeusClient {
    pub fn new(config: FareApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| WatchError::provider(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn access_token(&self) -> Result<String> {
        tracing::debug!("Requesting fare API token");
        let response = self
            .client
            .post(self.url(TOKEN_PATH))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("token request", e))?;

        let token: TokenResponse = read_json("token request", response).await?;
        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WatchError::provider("token response has no access_token"))
    }

    async fn search_once(&self, token: &str, request: &SearchRequest<'_>) -> Result<Vec<Offer>> {
        let mut query: Vec<(&str, String)> = vec![
            ("originLocationCode", request.route.origin.clone()),
            ("destinationLocationCode", request.route.destination.clone()),
            ("departureDate", request.departure.to_string()),
            ("adults", "1".to_string()),
            ("currencyCode", request.currency.to_string()),
            ("travelClass", request.cabin.provider_code().to_string()),
            ("max", self.config.max_results.to_string()),
        ];
        if let Some(ret) = request.return_date {
            query.push(("returnDate", ret.to_string()));
        }
        if self.config.non_stop {
            query.push(("nonStop", "true".to_string()));
        }
        if !self.config.airlines.is_empty() {
            query.push(("includedAirlineCodes", self.config.airlines.join(",")));
        }

        let context = format!(
            "search {} {} {}",
            request.route, request.departure, request.cabin
        );
        tracing::debug!("GET {} ({})", OFFERS_PATH, context);

        let response = self
            .client
            .get(self.url(OFFERS_PATH))
            .bearer_auth(token)
            .query(&query)
            .send()
            .await
            .map_err(|e| transport_error(&context, e))?;

        let body: FlightOffersResponse = read_json(&context, response).await?;
        let carriers = body.dictionaries.unwrap_or_default().carriers;

        body.data
            .into_iter()
            .map(|dto| to_offer(dto, request, &carriers))
            .collect()
    }
}

#[async_trait]
impl FareProvider for AmadeusClient {
    async fn search(&self, criteria: &Criteria) -> Result<Vec<Offer>> {
        let token = self.access_token().await?;
        let dates = criteria.window.departure_dates();
        let pause = Duration::from_millis(self.config.request_interval_ms);

        let mut offers = Vec::new();
        let mut sent = 0usize;
        for route in &criteria.routes {
            for departure in &dates {
                for cabin in &criteria.cabins {
                    if sent > 0 && !pause.is_zero() {
                        tokio::time::sleep(pause).await;
                    }
                    let request = SearchRequest {
                        route,
                        departure: *departure,
                        return_date: criteria.window.return_date(*departure),
                        cabin: *cabin,
                        currency: &criteria.currency,
                    };
                    let batch = self.search_once(&token, &request).await?;
                    sent += 1;
                    tracing::debug!(
                        "{} {} {}: {} offers",
                        route,
                        departure,
                        cabin,
                        batch.len()
                    );
                    offers.extend(batch);
                }
            }
        }

        tracing::debug!("{} search requests sent", sent);
        Ok(offers)
    }
}

fn transport_error(context: &str, error: reqwest::Error) -> WatchError {
    if error.is_timeout() {
        WatchError::provider(format!("{}: timed out", context))
    } else {
        WatchError::provider(format!("{}: {}", context, error))
    }
}

async fn read_json<T: DeserializeOwned>(context: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(context, e))?;

    if !status.is_success() {
        return Err(WatchError::provider(format!(
            "{}: HTTP {}: {}",
            context, status, body
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| WatchError::provider(format!("{}: malformed response: {}", context, e)))
}

/// `2026-11-02T07:00:00` → 2026-11-02
fn date_part(timestamp: &str) -> Option<NaiveDate> {
    let date = timestamp.split('T').next()?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

fn to_offer(
    dto: FlightOfferDto,
    request: &SearchRequest<'_>,
    carriers: &HashMap<String, String>,
) -> Result<Offer> {
    let price = dto
        .price
        .grand_total
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .ok_or_else(|| {
            WatchError::provider(format!(
                "malformed price '{}' for {}",
                dto.price.grand_total, request.route
            ))
        })?;

    let cabin = dto
        .traveler_pricings
        .iter()
        .flat_map(|tp| tp.fare_details_by_segment.iter())
        .find_map(|fd| fd.cabin.as_deref())
        .and_then(|c| c.parse::<CabinClass>().ok())
        .unwrap_or(request.cabin);

    let first_segment = |index: usize| {
        dto.itineraries
            .get(index)
            .and_then(|itinerary| itinerary.segments.first())
    };

    let departure_date = first_segment(0)
        .and_then(|s| date_part(&s.departure.at))
        .unwrap_or(request.departure);
    let return_date = first_segment(1)
        .and_then(|s| date_part(&s.departure.at))
        .or(request.return_date);

    let carrier_code = first_segment(0)
        .and_then(|s| s.carrier_code.clone())
        .or_else(|| dto.validating_airline_codes.first().cloned())
        .unwrap_or_else(|| "??".to_string());
    let airline = carriers
        .get(&carrier_code)
        .map(|name| title_case(name))
        .unwrap_or(carrier_code);

    Ok(Offer {
        origin: request.route.origin.clone(),
        destination: request.route.destination.clone(),
        departure_date,
        return_date,
        cabin,
        price,
        currency: dto.price.currency,
        airline,
    })
}

/// Carrier dictionaries are upper case (`AIR NEW ZEALAND`).
fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
