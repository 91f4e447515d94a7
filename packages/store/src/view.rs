//! Pure derivations from the stores to what the page shows.

use crate::models::{Service, ServiceId};
use crate::state::{Listing, ProfileCache};

pub const EMPTY_LISTING_TEXT: &str = "No services yet. Post one on the right.";

/// Services matching `query`, in listing order.
///
/// The query is trimmed and matched case-insensitively against title,
/// description and category. An empty query matches everything.
pub fn filter_services<'a>(services: &'a [Service], query: &str) -> Vec<&'a Service> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return services.iter().collect();
    }
    services
        .iter()
        .filter(|s| {
            s.title.to_lowercase().contains(&q)
                || s.description.to_lowercase().contains(&q)
                || s.category.to_lowercase().contains(&q)
        })
        .collect()
}

/// Who posted `service`: the owner's profile name, else the profile id, else
/// the raw owner id when no profile is cached.
pub fn owner_label(service: &Service, profiles: &ProfileCache) -> String {
    match profiles.get(&service.owner) {
        Some(profile) => profile
            .full_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| profile.id.clone()),
        None => service.owner.clone(),
    }
}

pub fn price_label(price: Option<f64>) -> String {
    match price {
        Some(price) => format!("₹{price}"),
        None => "₹—".to_string(),
    }
}

/// Everything one listing card renders.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceCard {
    pub id: ServiceId,
    pub title: String,
    pub price: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub owner: String,
}

impl ServiceCard {
    pub fn new(service: &Service, profiles: &ProfileCache) -> Self {
        Self {
            id: service.id.clone(),
            title: service.title.clone(),
            price: price_label(service.price),
            description: service.description.clone(),
            category: non_empty_or(&service.category, "General"),
            location: non_empty_or(&service.location, "Campus"),
            owner: owner_label(service, profiles),
        }
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// What the listing area shows above the cards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingStatus {
    Loading,
    Empty,
    Ready,
}

/// The composed listing: status plus one card per matching service.
///
/// Cards are present in every status; a refetch keeps the previous cards on
/// screen under the loading line.
#[derive(Clone, Debug, PartialEq)]
pub struct ListingView {
    pub status: ListingStatus,
    pub cards: Vec<ServiceCard>,
}

impl ListingView {
    pub fn compose(listing: &Listing, profiles: &ProfileCache, query: &str) -> Self {
        let cards: Vec<ServiceCard> = filter_services(listing.services(), query)
            .into_iter()
            .map(|s| ServiceCard::new(s, profiles))
            .collect();
        let status = if listing.loading() {
            ListingStatus::Loading
        } else if cards.is_empty() {
            ListingStatus::Empty
        } else {
            ListingStatus::Ready
        };
        Self { status, cards }
    }
}
