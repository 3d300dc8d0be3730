use crate::adapters::storage::LocalStorage;
use crate::core::filter::select_offers;
use crate::core::render::render_notification;
use crate::core::report::ReportWriter;
use crate::core::{Criteria, FareProvider, Mailbox, Notifier, RunOutcome, Storage};
use crate::utils::error::Result;
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub criteria: Criteria,
    pub recipient: Mailbox,
    /// Heading of the email; the subject adds the date and deal count.
    pub title: String,
    /// Per-offer link in the email; see `render::booking_link`.
    pub booking_url: Option<String>,
    pub dry_run: bool,
}

/// Query → filter → notify, once.
pub struct WatchEngine<P: FareProvider, N: Notifier, S: Storage = LocalStorage> {
    provider: P,
    notifier: N,
    settings: RunSettings,
    report: Option<ReportWriter<S>>,
    today: Option<NaiveDate>,
}

impl<P: FareProvider, N: Notifier> WatchEngine<P, N> {
    pub fn new(provider: P, notifier: N, settings: RunSettings) -> Self {
        Self {
            provider,
            notifier,
            settings,
            report: None,
            today: None,
        }
    }
}

impl<P: FareProvider, N: Notifier, S: Storage> WatchEngine<P, N, S> {
    /// Also write `fares.html` and `fares.csv` whenever there are matches.
    pub fn with_report<T: Storage>(self, storage: T) -> WatchEngine<P, N, T> {
        WatchEngine {
            provider: self.provider,
            notifier: self.notifier,
            settings: self.settings,
            report: Some(ReportWriter::new(storage)),
            today: self.today,
        }
    }

    /// Pins the date shown in the subject and heading.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let criteria = &self.settings.criteria;
        let today = self
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        tracing::info!(
            "🔎 Searching {} route(s), {} cabin(s), {} → {}",
            criteria.routes.len(),
            criteria.cabins.len(),
            criteria.window.start,
            criteria.window.end
        );
        let offers = self.provider.search(criteria).await?;
        tracing::info!("Fetched {} offers", offers.len());

        let selected = select_offers(&offers, criteria);
        tracing::info!("{} offers within price caps", selected.len());

        if selected.is_empty() {
            tracing::info!("No qualifying fares, nothing to send");
            return Ok(RunOutcome::NoMatches {
                fetched: offers.len(),
            });
        }

        let notification = render_notification(
            &self.settings.title,
            &self.settings.recipient,
            &selected,
            criteria,
            today,
            self.settings.booking_url.as_deref(),
        );

        if let Some(report) = &self.report {
            report.write(&notification, &selected).await?;
        }

        if self.settings.dry_run {
            tracing::info!("DRY RUN, email suppressed: {}", notification.subject);
            tracing::debug!("Email preview:\n{}", notification.text_body);
            return Ok(RunOutcome::DryRun {
                matched: selected.len(),
                subject: notification.subject,
            });
        }

        self.notifier.send(&notification).await?;
        tracing::info!(
            "📧 Sent {} deal(s) to {}",
            selected.len(),
            notification.recipient.email
        );

        Ok(RunOutcome::Notified {
            matched: selected.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CabinClass, DateWindow, Notification, Offer, Route};
    use crate::utils::error::WatchError;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct StubProvider {
        result: std::result::Result<Vec<Offer>, String>,
    }

    #[async_trait]
    impl FareProvider for StubProvider {
        async fn search(&self, _criteria: &Criteria) -> Result<Vec<Offer>> {
            self.result.clone().map_err(WatchError::provider)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<Notification>>>,
        reject: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: &Notification) -> Result<()> {
            if self.reject {
                return Err(WatchError::delivery("401 unauthorized"));
            }
            self.sent.lock().await.push(notification.clone());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MemoryStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn settings(dry_run: bool) -> RunSettings {
        RunSettings {
            criteria: Criteria {
                cabins: [CabinClass::Business].into(),
                max_price: 2000.0,
                cabin_caps: BTreeMap::new(),
                currency: "NZD".to_string(),
                routes: vec![Route::new("AKL", "SYD")],
                window: DateWindow {
                    start: today(),
                    end: today(),
                    step_days: 1,
                    stay_days: None,
                },
            },
            recipient: Mailbox {
                email: "me@example.com".to_string(),
                name: None,
            },
            title: "NZ→AU premium fares".to_string(),
            booking_url: None,
            dry_run,
        }
    }

    fn offer(cabin: CabinClass, price: f64) -> Offer {
        Offer {
            origin: "AKL".to_string(),
            destination: "SYD".to_string(),
            departure_date: today(),
            return_date: None,
            cabin,
            price,
            currency: "NZD".to_string(),
            airline: "Air New Zealand".to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_response_sends_nothing() {
        let notifier = RecordingNotifier::default();
        let provider = StubProvider { result: Ok(vec![]) };
        let engine = WatchEngine::new(provider, notifier.clone(), settings(false));

        let outcome = engine.run().await.unwrap();

        assert_eq!(outcome, RunOutcome::NoMatches { fetched: 0 });
        assert!(notifier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_no_matches_sends_nothing() {
        let notifier = RecordingNotifier::default();
        let provider = StubProvider {
            result: Ok(vec![offer(CabinClass::Economy, 300.0)]),
        };
        let engine = WatchEngine::new(provider, notifier.clone(), settings(false));

        let outcome = engine.run().await.unwrap();

        assert_eq!(outcome, RunOutcome::NoMatches { fetched: 1 });
        assert!(notifier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_stops_before_notifier() {
        let notifier = RecordingNotifier::default();
        let provider = StubProvider {
            result: Err("connection refused".to_string()),
        };
        let engine = WatchEngine::new(provider, notifier.clone(), settings(false));

        let err = engine.run().await.unwrap_err();

        assert!(matches!(err, WatchError::ProviderError { .. }));
        assert!(notifier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_matches_are_sent_once() {
        let notifier = RecordingNotifier::default();
        let provider = StubProvider {
            result: Ok(vec![
                offer(CabinClass::Business, 1500.0),
                offer(CabinClass::Economy, 300.0),
            ]),
        };
        let engine =
            WatchEngine::new(provider, notifier.clone(), settings(false)).with_today(today());

        let outcome = engine.run().await.unwrap();

        assert_eq!(outcome, RunOutcome::Notified { matched: 1 });
        let sent = notifier.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "NZ→AU premium fares – 19/10/26 (1 deal)");
        assert_eq!(sent[0].recipient.email, "me@example.com");
    }

    #[tokio::test]
    async fn test_delivery_error_is_returned() {
        let notifier = RecordingNotifier {
            reject: true,
            ..Default::default()
        };
        let provider = StubProvider {
            result: Ok(vec![offer(CabinClass::Business, 1500.0)]),
        };
        let engine = WatchEngine::new(provider, notifier, settings(false));

        let err = engine.run().await.unwrap_err();

        assert!(matches!(err, WatchError::DeliveryError { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_dry_run_writes_report_but_does_not_send() {
        let notifier = RecordingNotifier::default();
        let storage = MemoryStorage::default();
        let provider = StubProvider {
            result: Ok(vec![offer(CabinClass::Business, 1500.0)]),
        };
        let engine = WatchEngine::new(provider, notifier.clone(), settings(true))
            .with_today(today())
            .with_report(storage.clone());

        let outcome = engine.run().await.unwrap();

        assert!(matches!(outcome, RunOutcome::DryRun { matched: 1, .. }));
        assert!(notifier.sent.lock().await.is_empty());
        let files = storage.files.lock().await;
        assert!(files.contains_key("fares.html"));
        assert!(files.contains_key("fares.csv"));
    }
}
