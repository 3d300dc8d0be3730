use crate::core::{Criteria, Offer};

pub fn matches(offer: &Offer, criteria: &Criteria) -> bool {
    criteria.cabins.contains(&offer.cabin)
        && offer.currency.eq_ignore_ascii_case(&criteria.currency)
        && offer.price <= criteria.price_cap(offer.cabin)
}

/// Keeps the offers worth reporting, cheapest first. Ties are broken by
/// airline name; the sort is stable so equal offers keep provider order.
pub fn select_offers(offers: &[Offer], criteria: &Criteria) -> Vec<Offer> {
    let mut selected: Vec<Offer> = offers
        .iter()
        .filter(|offer| {
            let keep = matches(offer, criteria);
            if !keep {
                tracing::debug!(
                    "Reject {}->{} {} {:.2} {} ({})",
                    offer.origin,
                    offer.destination,
                    offer.cabin,
                    offer.price,
                    offer.currency,
                    offer.airline
                );
            }
            keep
        })
        .cloned()
        .collect();

    selected.sort_by(|a, b| {
        a.price
            .total_cmp(&b.price)
            .then_with(|| a.airline.cmp(&b.airline))
    });
    selected
}
