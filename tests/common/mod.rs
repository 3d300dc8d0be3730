#![allow(dead_code)]

use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tasman_fare_watch::config::watch_config::{EmailConfig, FareApiConfig};
use tasman_fare_watch::core::{CabinClass, Criteria, DateWindow, Route};

pub fn departure() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 2).unwrap()
}

pub fn fare_config(base_url: String) -> FareApiConfig {
    FareApiConfig {
        base_url,
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        timeout_seconds: 2,
        max_results: 50,
        non_stop: false,
        airlines: vec![],
        request_interval_ms: 0,
    }
}

pub fn email_config(base_url: String) -> EmailConfig {
    EmailConfig {
        base_url,
        api_key: "brevo-key".to_string(),
        sender_email: "bot@example.com".to_string(),
        sender_name: "NZ AU Fare Bot".to_string(),
        recipient_email: "me@example.com".to_string(),
        recipient_name: Some("Me".to_string()),
        timeout_seconds: 2,
        booking_url: "https://www.grabaseat.co.nz/".to_string(),
    }
}

/// One departure date, one-way, NZD.
pub fn criteria(routes: &[(&str, &str)], cabins: &[CabinClass], max_price: f64) -> Criteria {
    Criteria {
        cabins: cabins.iter().copied().collect(),
        max_price,
        cabin_caps: BTreeMap::new(),
        currency: "NZD".to_string(),
        routes: routes.iter().map(|(o, d)| Route::new(*o, *d)).collect(),
        window: DateWindow {
            start: departure(),
            end: departure(),
            step_days: 10,
            stay_days: None,
        },
    }
}

pub fn token_body() -> Value {
    json!({
        "type": "amadeusOAuth2Token",
        "access_token": "test-token",
        "expires_in": 1799
    })
}

/// A flight-offers item in the provider's shape.
pub fn offer_json(price: &str, cabin: &str, carrier: &str, departs_at: &str) -> Value {
    json!({
        "type": "flight-offer",
        "id": "1",
        "price": {"currency": "NZD", "total": price, "grandTotal": price},
        "itineraries": [{
            "duration": "PT3H30M",
            "segments": [{
                "departure": {"iataCode": "AKL", "at": departs_at},
                "arrival": {"iataCode": "SYD", "at": departs_at},
                "carrierCode": carrier,
                "number": "101"
            }]
        }],
        "travelerPricings": [{
            "travelerId": "1",
            "fareDetailsBySegment": [{"segmentId": "1", "cabin": cabin}]
        }],
        "validatingAirlineCodes": [carrier]
    })
}

pub fn offers_body(offers: Vec<Value>) -> Value {
    json!({
        "meta": {"count": offers.len()},
        "data": offers,
        "dictionaries": {
            "carriers": {"NZ": "AIR NEW ZEALAND", "QF": "QANTAS AIRWAYS", "JQ": "JETSTAR"}
        }
    })
}
