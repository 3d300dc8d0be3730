//! Turns the selected offers into the email that gets sent.
//!
//! Everything here is a pure function of its inputs, including the run
//! date, so the same offers always render the same message.

use crate::core::{CabinClass, Criteria, Mailbox, Notification, Offer};
use chrono::NaiveDate;

const FONT: &str = "font-family:Arial,Helvetica,sans-serif;";
const PILL_COLOURS: [&str; 4] = ["#86efac", "#fde68a", "#bfdbfe", "#fbcfe8"];

fn city_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "AKL" => "Auckland",
        "WLG" => "Wellington",
        "CHC" => "Christchurch",
        "ZQN" => "Queenstown",
        "DUD" => "Dunedin",
        "SYD" => "Sydney",
        "MEL" => "Melbourne",
        "BNE" => "Brisbane",
        "OOL" => "Gold Coast",
        "CBR" => "Canberra",
        "ADL" => "Adelaide",
        "PER" => "Perth",
        "CNS" => "Cairns",
        _ => return None,
    };
    Some(name)
}

pub fn airport_label(code: &str) -> String {
    match city_name(code) {
        Some(name) => format!("{} ({})", name, code),
        None => code.to_string(),
    }
}

/// `dd/mm/yy`, the way dates are written in New Zealand.
pub fn nz_date(date: NaiveDate) -> String {
    date.format("%d/%m/%y").to_string()
}

/// Two decimals with thousands separators, e.g. `1,234.50`.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn travel_dates(offer: &Offer) -> String {
    match offer.return_date {
        Some(ret) => format!("{} → {}", nz_date(offer.departure_date), nz_date(ret)),
        None => nz_date(offer.departure_date),
    }
}

fn thresholds(criteria: &Criteria) -> String {
    criteria
        .cabins
        .iter()
        .map(|cabin| {
            format!(
                "{} ≤ {} {}",
                cabin.label(),
                format_amount(criteria.price_cap(*cabin)),
                criteria.currency
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fills `{origin}`, `{destination}`, `{departure}`, `{return}` and `{cabin}`
/// in a booking URL. A URL without placeholders is used as is.
pub fn booking_link(template: &str, offer: &Offer) -> String {
    let return_date = offer
        .return_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    template
        .replace("{origin}", &offer.origin)
        .replace("{destination}", &offer.destination)
        .replace("{departure}", &offer.departure_date.to_string())
        .replace("{return}", &return_date)
        .replace("{cabin}", offer.cabin.provider_code())
}

/// Cheapest price per cabin of interest, in cabin order; `None` when no
/// offer in that cabin made the cut.
pub fn best_fares(offers: &[Offer], criteria: &Criteria) -> Vec<(CabinClass, Option<f64>)> {
    criteria
        .cabins
        .iter()
        .map(|cabin| {
            let best = offers
                .iter()
                .filter(|offer| offer.cabin == *cabin)
                .map(|offer| offer.price)
                .min_by(|a, b| a.total_cmp(b));
            (*cabin, best)
        })
        .collect()
}

fn best_fare_label(cabin: CabinClass, best: Option<f64>, currency: &str) -> String {
    match best {
        Some(price) => format!("{} best: {} {}", cabin.label(), format_amount(price), currency),
        None => format!("{} best: none", cabin.label()),
    }
}

pub fn render_subject(title: &str, today: NaiveDate, matched: usize) -> String {
    let noun = if matched == 1 { "deal" } else { "deals" };
    format!("{} – {} ({} {})", title, nz_date(today), matched, noun)
}

pub fn render_html(
    title: &str,
    offers: &[Offer],
    criteria: &Criteria,
    today: NaiveDate,
    booking_url: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(offers.len() + 8);

    parts.push(format!(
        "<h1 style=\"{}\">{} – {}</h1>",
        FONT,
        escape_html(title),
        nz_date(today)
    ));
    parts.push(format!(
        "<p style=\"{}\">Window: {} → {} | Thresholds: {}</p>",
        FONT,
        nz_date(criteria.window.start),
        nz_date(criteria.window.end),
        escape_html(&thresholds(criteria))
    ));

    let pills: Vec<String> = best_fares(offers, criteria)
        .into_iter()
        .enumerate()
        .map(|(i, (cabin, best))| {
            format!(
                "<span style=\"background:{};color:#111;padding:4px 8px;border-radius:999px;font-size:12px;margin-right:6px;\">{}</span>",
                PILL_COLOURS[i % PILL_COLOURS.len()],
                escape_html(&best_fare_label(cabin, best, &criteria.currency))
            )
        })
        .collect();
    parts.push(format!("<p style=\"{}\">{}</p>", FONT, pills.join(" ")));

    parts.push(format!(
        "<table style=\"border-collapse:collapse;{}font-size:13px;width:100%;\">",
        FONT
    ));
    let mut header = String::from("<thead><tr style=\"background-color:#eeeeee;\">");
    let columns = ["Route", "Dates", "Cabin", "Price", "Airline", "Link"];
    let shown = if booking_url.is_some() { 6 } else { 5 };
    for column in &columns[..shown] {
        header.push_str(&format!(
            "<th style=\"text-align:left;padding:6px 8px;\">{}</th>",
            column
        ));
    }
    header.push_str("</tr></thead><tbody>");
    parts.push(header);

    for offer in offers {
        let link = booking_url
            .map(|url| {
                format!(
                    "<td style=\"padding:4px 8px;\"><a href=\"{}\">Book / Check</a></td>",
                    escape_html(&booking_link(url, offer))
                )
            })
            .unwrap_or_default();
        parts.push(format!(
            "<tr>\
             <td style=\"padding:4px 8px;\">{} → {}</td>\
             <td style=\"padding:4px 8px;\">{}</td>\
             <td style=\"padding:4px 8px;\">{}</td>\
             <td style=\"padding:4px 8px;\"><span style=\"color:#2e7d32;font-weight:bold;\">{} {}</span></td>\
             <td style=\"padding:4px 8px;\">{}</td>\
             {}</tr>",
            escape_html(&airport_label(&offer.origin)),
            escape_html(&airport_label(&offer.destination)),
            travel_dates(offer),
            offer.cabin.label(),
            format_amount(offer.price),
            escape_html(&offer.currency),
            escape_html(&offer.airline),
            link
        ));
    }

    parts.push("</tbody></table>".to_string());
    parts.join("\n")
}

pub fn render_text(
    title: &str,
    offers: &[Offer],
    criteria: &Criteria,
    today: NaiveDate,
    booking_url: Option<&str>,
) -> String {
    let best = best_fares(offers, criteria)
        .into_iter()
        .map(|(cabin, best)| best_fare_label(cabin, best, &criteria.currency))
        .collect::<Vec<_>>()
        .join(", ");
    let mut lines = vec![
        format!("{} – {}", title, nz_date(today)),
        format!("Thresholds: {}", thresholds(criteria)),
        best,
        String::new(),
    ];

    for (index, offer) in offers.iter().enumerate() {
        let mut line = format!(
            "{}. {} → {} | {} | {} | {} {} | {}",
            index + 1,
            airport_label(&offer.origin),
            airport_label(&offer.destination),
            travel_dates(offer),
            offer.cabin.label(),
            format_amount(offer.price),
            offer.currency,
            offer.airline
        );
        if let Some(url) = booking_url {
            line.push_str(" | ");
            line.push_str(&booking_link(url, offer));
        }
        lines.push(line);
    }

    lines.join("\n")
}

/// Builds the notification for already-selected offers, in their order.
pub fn render_notification(
    title: &str,
    recipient: &Mailbox,
    offers: &[Offer],
    criteria: &Criteria,
    today: NaiveDate,
    booking_url: Option<&str>,
) -> Notification {
    Notification {
        recipient: recipient.clone(),
        subject: render_subject(title, today, offers.len()),
        html_body: render_html(title, offers, criteria, today, booking_url),
        text_body: render_text(title, offers, criteria, today, booking_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DateWindow, Route};
    use std::collections::BTreeMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn criteria() -> Criteria {
        Criteria {
            cabins: [CabinClass::PremiumEconomy, CabinClass::Business].into(),
            max_price: 1500.0,
            cabin_caps: BTreeMap::from([(CabinClass::PremiumEconomy, 1300.0)]),
            currency: "NZD".to_string(),
            routes: vec![Route::new("AKL", "SYD")],
            window: DateWindow {
                start: today(),
                end: NaiveDate::from_ymd_opt(2027, 1, 19).unwrap(),
                step_days: 10,
                stay_days: Some(8),
            },
        }
    }

    fn offer(price: f64, airline: &str) -> Offer {
        Offer {
            origin: "AKL".to_string(),
            destination: "SYD".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2026, 11, 10),
            cabin: CabinClass::Business,
            price,
            currency: "NZD".to_string(),
            airline: airline.to_string(),
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1234.567), "1,234.57");
        assert_eq!(format_amount(1234567.0), "1,234,567.00");
    }

    #[test]
    fn test_subject_counts_deals() {
        assert_eq!(
            render_subject("NZ→AU premium fares", today(), 1),
            "NZ→AU premium fares – 19/10/26 (1 deal)"
        );
        assert!(render_subject("x", today(), 3).ends_with("(3 deals)"));
    }

    #[test]
    fn test_text_keeps_offer_order() {
        let offers = vec![offer(1100.0, "Qantas"), offer(1450.0, "Air New Zealand")];
        let text = render_text("Fares", &offers, &criteria(), today(), None);

        let qantas = text.find("Qantas").unwrap();
        let air_nz = text.find("Air New Zealand").unwrap();
        assert!(qantas < air_nz);
        assert!(text.contains("1. Auckland (AKL) → Sydney (SYD) | 02/11/26 → 10/11/26"));
        assert!(text.contains("Premium Economy ≤ 1,300.00 NZD, Business ≤ 1,500.00 NZD"));
    }

    #[test]
    fn test_html_escapes_provider_text() {
        let offers = vec![offer(1100.0, "<script>Bad & Co</script>")];
        let html = render_html("Fares", &offers, &criteria(), today(), None);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;Bad &amp; Co&lt;/script&gt;"));
        assert!(html.contains("1,100.00 NZD"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let offers = vec![offer(1100.0, "Qantas")];
        let recipient = Mailbox {
            email: "me@example.com".to_string(),
            name: None,
        };
        let first = render_notification("Fares", &recipient, &offers, &criteria(), today(), None);
        let second = render_notification("Fares", &recipient, &offers, &criteria(), today(), None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_booking_link_fills_placeholders() {
        let template = "https://fares.example/{origin}-{destination}?out={departure}&back={return}&cabin={cabin}";
        assert_eq!(
            booking_link(template, &offer(1100.0, "Qantas")),
            "https://fares.example/AKL-SYD?out=2026-11-02&back=2026-11-10&cabin=BUSINESS"
        );
        assert_eq!(
            booking_link("https://www.grabaseat.co.nz/", &offer(1100.0, "Qantas")),
            "https://www.grabaseat.co.nz/"
        );
    }

    #[test]
    fn test_link_column_only_with_booking_url() {
        let offers = vec![offer(1100.0, "Qantas")];
        let url = Some("https://fares.example/{origin}?a=1&b={cabin}");

        let with_link = render_html("Fares", &offers, &criteria(), today(), url);
        assert!(with_link.contains(">Link</th>"));
        assert!(with_link.contains(
            "<a href=\"https://fares.example/AKL?a=1&amp;b=BUSINESS\">Book / Check</a>"
        ));
        let text = render_text("Fares", &offers, &criteria(), today(), url);
        assert!(text.ends_with("| Qantas | https://fares.example/AKL?a=1&b=BUSINESS"));

        let without = render_html("Fares", &offers, &criteria(), today(), None);
        assert!(!without.contains("Link"));
        assert!(!without.contains("<a href"));
    }

    #[test]
    fn test_best_fare_per_cabin_summary() {
        let mut premium = offer(1250.0, "Air New Zealand");
        premium.cabin = CabinClass::PremiumEconomy;
        let offers = vec![offer(1450.0, "Qantas"), premium, offer(1100.0, "Qantas")];

        assert_eq!(
            best_fares(&offers, &criteria()),
            vec![
                (CabinClass::PremiumEconomy, Some(1250.0)),
                (CabinClass::Business, Some(1100.0)),
            ]
        );

        let text = render_text("Fares", &offers[..1], &criteria(), today(), None);
        assert!(text.contains("Premium Economy best: none, Business best: 1,450.00 NZD"));
        let html = render_html("Fares", &offers, &criteria(), today(), None);
        assert!(html.contains("Premium Economy best: 1,250.00 NZD</span>"));
        assert!(html.contains("Business best: 1,100.00 NZD</span>"));
    }
}
