use crate::core::{Notification, Offer, Storage};
use crate::utils::error::{Result, WatchError};

pub const HTML_REPORT: &str = "fares.html";
pub const CSV_REPORT: &str = "fares.csv";

pub fn render_csv(offers: &[Offer]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "origin",
        "destination",
        "departure_date",
        "return_date",
        "cabin",
        "price",
        "currency",
        "airline",
    ])?;

    for offer in offers {
        writer.write_record([
            offer.origin.clone(),
            offer.destination.clone(),
            offer.departure_date.to_string(),
            offer
                .return_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            offer.cabin.provider_code().to_string(),
            format!("{:.2}", offer.price),
            offer.currency.clone(),
            offer.airline.clone(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| WatchError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes a copy of each run's matches next to the email.
pub struct ReportWriter<S: Storage> {
    storage: S,
}

impl<S: Storage> ReportWriter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn write(&self, notification: &Notification, offers: &[Offer]) -> Result<()> {
        tracing::debug!("Writing {} and {}", HTML_REPORT, CSV_REPORT);
        self.storage
            .write_file(HTML_REPORT, notification.html_body.as_bytes())
            .await?;

        let csv = render_csv(offers)?;
        self.storage.write_file(CSV_REPORT, csv.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CabinClass;
    use chrono::NaiveDate;

    #[test]
    fn test_csv_has_header_and_rows_in_order() {
        let offers = vec![
            Offer {
                origin: "AKL".to_string(),
                destination: "MEL".to_string(),
                departure_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
                return_date: None,
                cabin: CabinClass::PremiumEconomy,
                price: 999.0,
                currency: "NZD".to_string(),
                airline: "Air New Zealand".to_string(),
            },
            Offer {
                origin: "AKL".to_string(),
                destination: "SYD".to_string(),
                departure_date: NaiveDate::from_ymd_opt(2026, 11, 12).unwrap(),
                return_date: NaiveDate::from_ymd_opt(2026, 11, 20),
                cabin: CabinClass::Business,
                price: 1499.5,
                currency: "NZD".to_string(),
                airline: "Qantas, Ltd".to_string(),
            },
        ];

        let csv = render_csv(&offers).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("origin,destination"));
        assert_eq!(
            lines[1],
            "AKL,MEL,2026-11-02,,PREMIUM_ECONOMY,999.00,NZD,Air New Zealand"
        );
        assert_eq!(
            lines[2],
            "AKL,SYD,2026-11-12,2026-11-20,BUSINESS,1499.50,NZD,\"Qantas, Ltd\""
        );
    }
}
