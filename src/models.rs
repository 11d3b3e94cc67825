//! Domain records returned to callers. Built once by the response mapper
//! and immutable afterwards; `fetch_time` is stamped at construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An advertiser page from the typeahead search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub name: String,
    pub category: String,
    pub entity_type: String,
    pub image_uri: String,
    pub likes: i64,
    pub page_alias: String,
    pub page_is_deleted: bool,
    pub country: Option<String>,
    pub ig_username: Option<String>,
    pub ig_followers: Option<i64>,
    pub ig_verification: Option<bool>,
    pub verification: Option<String>,
    pub fetch_time: DateTime<Utc>,
}

/// One ad from a page's listing. Creative fields are whatever the snapshot
/// carried; absent fields stay absent rather than defaulting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ad {
    pub id: String,
    pub page_id: String,
    pub page_name: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub caption: Option<String>,
    pub cta_text: Option<String>,
    pub cta_type: Option<String>,
    pub link_url: Option<String>,
    pub image_url: Option<String>,
    pub platforms: Vec<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub fetch_time: DateTime<Utc>,
}

/// One page of a listing plus the connection cursor needed to continue it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdListing {
    pub ads: Vec<Ad>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

/// Audience targeting disclosed for an ad. Reach figures are passed through
/// opaquely; their shape is the service's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Targeting {
    pub locations: Vec<String>,
    pub excluded_locations: Vec<String>,
    pub gender: String,
    pub age_range: AgeRange,
    pub eu_total_reach: Option<Value>,
    pub demographic_breakdown: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdInfo {
    pub archive_id: String,
    pub page_id: String,
    pub spend: Option<Value>,
    pub is_political: bool,
    pub targeting: Targeting,
    pub payer_beneficiary: Vec<Value>,
    pub is_taken_down: bool,
    pub has_violations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub name: String,
    pub category: String,
    pub about: Option<String>,
    pub verification: String,
    pub profile_url: Option<String>,
    pub likes: i64,
}

/// Full detail for a single ad: the ad-level disclosure plus its page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdDetail {
    pub ad: AdInfo,
    pub page: PageInfo,
    pub fetch_time: DateTime<Utc>,
}
