use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::MovieCandidate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityType {
    Subscription,
    Free,
    Rent,
    Buy,
}

impl AvailabilityType {
    /// Lower is better: subscription > free > rent > buy
    pub fn priority(self) -> u8 {
        match self {
            AvailabilityType::Subscription => 0,
            AvailabilityType::Free => 1,
            AvailabilityType::Rent => 2,
            AvailabilityType::Buy => 3,
        }
    }

    /// Maps provider type labels; add-on channels count as subscriptions
    /// and ad-supported streams as free
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "sub" | "subscription" | "addon" => Some(AvailabilityType::Subscription),
            "free" | "ads" => Some(AvailabilityType::Free),
            "rent" => Some(AvailabilityType::Rent),
            "buy" | "purchase" => Some(AvailabilityType::Buy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Price {
    pub amount: f64,
    pub formatted: String,
}

/// One way to watch a title on one service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamingOption {
    pub service: String,
    #[serde(rename = "type")]
    pub availability_type: AvailabilityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

/// Collapses options to one per service, keeping the best availability
/// type. Services stay in the order and spelling they first appeared in.
pub fn dedupe_by_service(options: Vec<StreamingOption>) -> Vec<StreamingOption> {
    let mut deduped: Vec<StreamingOption> = Vec::with_capacity(options.len());

    for option in options {
        let existing = deduped
            .iter_mut()
            .find(|o| o.service.eq_ignore_ascii_case(&option.service));

        match existing {
            Some(current)
                if option.availability_type.priority() < current.availability_type.priority() =>
            {
                let service = std::mem::take(&mut current.service);
                *current = StreamingOption { service, ..option };
            }
            Some(_) => {}
            None => deduped.push(option),
        }
    }

    deduped
}

/// Availability lookup parameters for one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRequest {
    pub id: i64,
    pub region: String,
    pub title: String,
    pub release_year: Option<i32>,
}

impl AvailabilityRequest {
    pub fn for_candidate(candidate: &MovieCandidate, region: &str) -> Self {
        Self {
            id: candidate.id,
            region: region.to_lowercase(),
            title: candidate.title.clone(),
            release_year: candidate.release_year(),
        }
    }
}

// ============================================================================
// Streaming Availability API Types
// ============================================================================

/// API response from GET /shows/{type}/{id} and elements of the title search
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiShowDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub streaming_options: HashMap<String, Vec<ApiStreamingOption>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStreamingOption {
    pub service: ApiService,
    #[serde(rename = "type")]
    pub availability_type: String,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub price: Option<ApiPrice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiService {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPrice {
    pub amount: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub formatted: Option<String>,
}

impl ApiPrice {
    pub fn to_price(&self) -> Option<Price> {
        let amount: f64 = self.amount.trim().parse().ok()?;
        let formatted = match (&self.formatted, &self.currency) {
            (Some(formatted), _) => formatted.clone(),
            (None, Some(currency)) => format!("{:.2} {}", amount, currency),
            (None, None) => format!("{:.2}", amount),
        };
        Some(Price { amount, formatted })
    }
}
