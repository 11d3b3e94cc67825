//! Ad Library GraphQL client.
//!
//! The service publishes no API: operations replay the browser's own
//! GraphQL calls (persisted-query doc ids, form-encoded bodies, signing
//! fields) and the response shapes here were captured from live traffic.
//! Every wire field is optional so a schema drift degrades to absent data
//! instead of a parse failure.

use std::path::PathBuf;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::credentials::Credentials;
use crate::error::{AdLensError, Result};
use crate::http::HttpClient;
use crate::models::{Ad, AdDetail, AdInfo, AdListing, AgeRange, Page, PageInfo, Targeting};
use crate::session::SessionTokens;
use crate::signer::signing_params;

pub const DEFAULT_BASE_URL: &str = "https://www.facebook.com";
pub const GRAPHQL_PATH: &str = "/api/graphql/";
pub const LANDING_PATH: &str = "/ads/library/";

// Persisted-query ids, one constant per operation. Reassigned by the service
// between client revisions; when an operation starts returning empty data,
// recapture these from browser traffic.
const DOC_ID_PAGE_SEARCH: &str = "9333890689970605";
const DOC_ID_PAGE_ADS: &str = "8539922039449935";
const DOC_ID_AD_DETAILS: &str = "9407590475934210";

const FRIENDLY_PAGE_SEARCH: &str = "useAdLibraryTypeaheadSuggestionDataSourceQuery";
const FRIENDLY_PAGE_ADS: &str = "AdLibrarySearchPaginationQuery";
const FRIENDLY_AD_DETAILS: &str = "AdLibraryAdDetailsV2Query";

const LISTING_PAGE_SIZE: u32 = 30;
// Listing query version marker, captured alongside the doc id.
const LISTING_VERSION: &str = "96184a";

/// Anti-JSON-hijacking prefix the service puts in front of every body.
const PAYLOAD_PREFIX: &str = "for (;;);";

// ============================================================================
// Wire types
//
// Everything under `data.ad_library_main`, with every field defaulted: the
// schema is undocumented and unstable, and a missing branch must read as
// "absent", never as an error.
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
struct WireMain {
    #[serde(default)]
    typeahead_suggestions: Option<WireTypeaheadSuggestions>,
    #[serde(default)]
    search_results_connection: Option<WireSearchConnection>,
    #[serde(default)]
    ad_details: Option<WireAdDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireTypeaheadSuggestions {
    #[serde(default)]
    page_results: Vec<WirePageResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WirePageResult {
    // Ids arrive as strings or numbers depending on the surface.
    #[serde(default)]
    page_id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    verification: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    entity_type: Option<String>,
    #[serde(default)]
    ig_username: Option<String>,
    #[serde(default)]
    ig_followers: Option<i64>,
    #[serde(default)]
    ig_verification: Option<bool>,
    #[serde(default)]
    image_uri: Option<String>,
    #[serde(default)]
    likes: Option<i64>,
    #[serde(default)]
    page_alias: Option<String>,
    #[serde(default)]
    page_is_deleted: Option<bool>,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireSearchConnection {
    #[serde(default)]
    edges: Vec<WireEdge>,
    #[serde(default)]
    page_info: WireCursorInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireEdge {
    #[serde(default)]
    node: WireNode,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireNode {
    // Entries are sometimes null; those are skipped silently.
    #[serde(default)]
    collated_results: Vec<Option<WireCollatedResult>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireCollatedResult {
    #[serde(default)]
    ad_archive_id: Option<Value>,
    #[serde(default)]
    page_id: Option<Value>,
    #[serde(default)]
    page_name: Option<String>,
    #[serde(default)]
    start_date: Option<i64>,
    #[serde(default)]
    end_date: Option<i64>,
    #[serde(default)]
    snapshot: Option<WireSnapshot>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireSnapshot {
    #[serde(default)]
    title: Option<String>,
    // Plain string on older ads, `{"text": ...}` on newer ones.
    #[serde(default)]
    body: Option<Value>,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    cta_text: Option<String>,
    #[serde(default)]
    cta_type: Option<String>,
    #[serde(default)]
    link_url: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    publisher_platform: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireCursorInfo {
    #[serde(default)]
    end_cursor: Option<String>,
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireAdDetails {
    #[serde(default)]
    advertiser: Option<WireAdvertiser>,
    #[serde(default)]
    aaa_info: Option<WireAaaInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireAdvertiser {
    #[serde(default)]
    ad_library_page_info: Option<WireAdvertiserPageInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireAdvertiserPageInfo {
    #[serde(default)]
    page_name: Option<String>,
    #[serde(default)]
    page_category: Option<String>,
    #[serde(default)]
    page_about: Option<String>,
    #[serde(default)]
    page_verification: Option<String>,
    #[serde(default)]
    page_profile_uri: Option<String>,
    #[serde(default)]
    page_like_count: Option<i64>,
    #[serde(default)]
    page_spend: Option<WirePageSpend>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WirePageSpend {
    #[serde(default)]
    is_political_page: bool,
    #[serde(default)]
    lifetime_by_disclaimer: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireAaaInfo {
    #[serde(default)]
    location_audience: Vec<Option<WireLocation>>,
    #[serde(default)]
    gender_audience: Option<String>,
    #[serde(default)]
    age_audience: Option<WireAgeAudience>,
    #[serde(default)]
    eu_total_reach: Option<Value>,
    #[serde(default)]
    age_country_gender_reach_breakdown: Vec<Value>,
    #[serde(default)]
    payer_beneficiary_data: Vec<Value>,
    #[serde(default)]
    is_ad_taken_down: bool,
    #[serde(default)]
    has_violating_payer_beneficiary: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireLocation {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    excluded: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireAgeAudience {
    #[serde(default)]
    min: Option<u32>,
    #[serde(default)]
    max: Option<u32>,
}

// ============================================================================
// Response decoding
// ============================================================================

/// Strip the anti-hijacking prefix and decode. Decode failures are logged
/// and collapse to the empty object so downstream access sees "no data"
/// rather than a hard failure.
pub fn parse_graphql_body(text: &str) -> Value {
    let stripped = text.strip_prefix(PAYLOAD_PREFIX).unwrap_or(text);
    match serde_json::from_str(stripped) {
        Ok(value) => value,
        Err(e) => {
            error!(error = %e, "Failed to decode GraphQL response body");
            Value::Object(Default::default())
        }
    }
}

/// Pull the `data.ad_library_main` subtree out of a decoded response. A
/// response without `data` is a failed request; everything below that is
/// defensive and degrades to defaults.
fn main_section(decoded: &Value) -> Result<WireMain> {
    let data = decoded
        .get("data")
        .filter(|v| !v.is_null())
        .ok_or_else(|| AdLensError::MissingData("data".to_string()))?;

    let main = data.get("ad_library_main").cloned().unwrap_or(Value::Null);
    if main.is_null() {
        return Ok(WireMain::default());
    }
    Ok(serde_json::from_value(main).unwrap_or_else(|e| {
        debug!(error = %e, "ad_library_main did not match the expected shape");
        WireMain::default()
    }))
}

// ============================================================================
// Client
// ============================================================================

pub struct AdLibraryClient {
    http: HttpClient,
    tokens: SessionTokens,
    base_url: String,
    artifact_dir: Option<PathBuf>,
}

impl AdLibraryClient {
    /// Connect against the production endpoint, persisting debug artifacts
    /// under `data/`.
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        Self::connect_with(credentials, DEFAULT_BASE_URL, Some(PathBuf::from("data"))).await
    }

    /// Connect with an explicit base URL (tests point this at a local mock)
    /// and artifact directory (`None` disables persistence).
    ///
    /// Bootstraps the session by scraping the landing page once. A failed
    /// bootstrap degrades the session (empty token substitutions) but never
    /// fails construction.
    pub async fn connect_with(
        credentials: &Credentials,
        base_url: &str,
        artifact_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        let http = HttpClient::new(credentials, &base_url)?;
        let mut client = Self {
            http,
            tokens: SessionTokens::default(),
            base_url,
            artifact_dir,
        };
        client.bootstrap_session().await;
        Ok(client)
    }

    async fn bootstrap_session(&mut self) {
        let url = format!("{}{}", self.base_url, LANDING_PATH);
        match self.http.get_text(&url).await {
            Ok(body) => self.tokens = SessionTokens::from_html(&body),
            Err(e) => {
                warn!(error = %e, "Session bootstrap failed; continuing with empty tokens");
            }
        }
    }

    /// Current session token state. The request counter advances with every
    /// operation issued through this client.
    pub fn session(&self) -> &SessionTokens {
        &self.tokens
    }

    /// Search advertiser pages by free text.
    pub async fn search_pages(&mut self, query: &str) -> Result<Vec<Page>> {
        let variables = json!({
            "queryString": query,
            "isMobile": false,
            "country": "ALL",
            "adType": "ALL",
        });

        let decoded = self
            .graphql(FRIENDLY_PAGE_SEARCH, DOC_ID_PAGE_SEARCH, &variables, "search.json")
            .await?;
        let main = main_section(&decoded)?;

        let pages: Vec<Page> = main
            .typeahead_suggestions
            .unwrap_or_default()
            .page_results
            .into_iter()
            .filter_map(map_page)
            .collect();

        info!(count = pages.len(), query, "Page search complete");
        Ok(pages)
    }

    /// Fetch one page of a page's ad listing (up to 30 ads). Pass the
    /// previous listing's `end_cursor` to continue the connection.
    pub async fn page_ads(&mut self, page_id: &str, cursor: Option<&str>) -> Result<AdListing> {
        let variables = json!({
            "activeStatus": "active",
            "adType": "ALL",
            "bylines": [],
            "collationToken": Uuid::new_v4().to_string(),
            "contentLanguages": [],
            "countries": ["ALL"],
            "cursor": cursor,
            "excludedIDs": [],
            "first": LISTING_PAGE_SIZE,
            "isTargetedCountry": false,
            "location": null,
            "mediaType": "all",
            "multiCountryFilterMode": null,
            "pageIDs": [],
            "potentialReachInput": null,
            "publisherPlatforms": [],
            "queryString": "",
            "regions": null,
            "searchType": "page",
            "sessionID": Uuid::new_v4().to_string(),
            "sortData": null,
            "source": null,
            "startDate": null,
            "v": LISTING_VERSION,
            "viewAllPageID": page_id,
        });

        let decoded = self
            .graphql(FRIENDLY_PAGE_ADS, DOC_ID_PAGE_ADS, &variables, "ads.json")
            .await?;
        let main = main_section(&decoded)?;

        let connection = main.search_results_connection.unwrap_or_default();
        let ads: Vec<Ad> = connection
            .edges
            .into_iter()
            .flat_map(|edge| edge.node.collated_results)
            .flatten()
            .filter_map(map_collated_result)
            .collect();

        info!(
            count = ads.len(),
            page_id,
            has_next_page = connection.page_info.has_next_page,
            "Fetched ad listing page"
        );
        Ok(AdListing {
            ads,
            end_cursor: connection.page_info.end_cursor,
            has_next_page: connection.page_info.has_next_page,
        })
    }

    /// Follow the listing connection to exhaustion. A failed follow-up page
    /// ends the walk with whatever was collected; a failed first page is a
    /// failed operation.
    pub async fn all_page_ads(&mut self, page_id: &str) -> Result<Vec<Ad>> {
        let first = self.page_ads(page_id, None).await?;
        let mut ads = first.ads;
        let mut cursor = first.end_cursor;
        let mut has_next = first.has_next_page;

        while has_next {
            let Some(current) = cursor.take() else {
                // Connection claims more pages but gave no cursor to ask
                // with; nothing further to do.
                break;
            };
            match self.page_ads(page_id, Some(&current)).await {
                Ok(listing) => {
                    ads.extend(listing.ads);
                    cursor = listing.end_cursor;
                    has_next = listing.has_next_page;
                }
                Err(e) => {
                    warn!(error = %e, page_id, "Follow-up listing page failed; keeping ads collected so far");
                    break;
                }
            }
        }

        Ok(ads)
    }

    /// Fetch the disclosure detail for a single ad. An `Err` means "details
    /// unavailable" and is distinct from any record of defaults.
    pub async fn ad_details(&mut self, ad_archive_id: &str, page_id: &str) -> Result<AdDetail> {
        let variables = json!({
            "adArchiveID": ad_archive_id,
            "pageID": page_id,
            "country": "ALL",
            "sessionID": Uuid::new_v4().to_string(),
            "source": null,
            "isAdNonPolitical": true,
            "isAdNotAAAEligible": false,
            "__relay_internal__pv__AdLibraryFinservGraphQLGKrelayprovider": true,
        });

        let decoded = self
            .graphql(FRIENDLY_AD_DETAILS, DOC_ID_AD_DETAILS, &variables, "details.json")
            .await?;
        let main = main_section(&decoded)?;

        let details = main
            .ad_details
            .ok_or_else(|| AdLensError::MissingData("ad_details".to_string()))?;

        info!(ad_archive_id, page_id, "Fetched ad details");
        Ok(map_ad_detail(ad_archive_id, page_id, details))
    }

    /// Compose the form body (signing fields + operation fields), POST, and
    /// decode. The decoded response is persisted as a debug artifact before
    /// any shape checks run, so rejected responses can still be inspected.
    async fn graphql(
        &mut self,
        friendly_name: &'static str,
        doc_id: &'static str,
        variables: &Value,
        artifact: &str,
    ) -> Result<Value> {
        let mut fields = signing_params(&mut self.tokens);
        fields.push(("fb_api_caller_class", "RelayModern".to_string()));
        fields.push(("fb_api_req_friendly_name", friendly_name.to_string()));
        fields.push(("variables", serde_json::to_string(variables)?));
        fields.push(("server_timestamps", "true".to_string()));
        fields.push(("doc_id", doc_id.to_string()));

        let lsd = self.tokens.lsd.clone().unwrap_or_default();
        let url = format!("{}{}", self.base_url, GRAPHQL_PATH);

        debug!(friendly_name, doc_id, "Issuing GraphQL request");
        let body = self.http.post_form(&url, &fields, friendly_name, &lsd).await?;

        let decoded = parse_graphql_body(&body);
        self.persist_artifact(artifact, &decoded);
        Ok(decoded)
    }

    fn persist_artifact(&self, name: &str, payload: &Value) {
        let Some(dir) = &self.artifact_dir else {
            return;
        };
        let path = dir.join(name);
        let pretty = serde_json::to_string_pretty(payload).unwrap_or_default();
        if let Err(e) = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, pretty)) {
            warn!(path = %path.display(), error = %e, "Failed to persist response artifact");
        }
    }
}

// ============================================================================
// Mapping: wire types -> domain records
// ============================================================================

fn value_to_string(v: Option<Value>) -> String {
    match v {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Normalize the snapshot body: plain string and `{"text": ...}` both
/// become the text, anything else is absent.
fn normalize_body(body: Option<&Value>) -> Option<String> {
    match body {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(obj)) => obj.get("text").and_then(|t| t.as_str()).map(String::from),
        _ => None,
    }
}

fn map_page(result: WirePageResult) -> Option<Page> {
    let id = value_to_string(result.page_id);
    if id.is_empty() {
        debug!("Skipping search result without page id");
        return None;
    }

    Some(Page {
        id,
        name: result.name.unwrap_or_default(),
        category: result.category.unwrap_or_default(),
        entity_type: result.entity_type.unwrap_or_default(),
        image_uri: result.image_uri.unwrap_or_default(),
        likes: result.likes.unwrap_or(0),
        page_alias: result.page_alias.unwrap_or_default(),
        page_is_deleted: result.page_is_deleted.unwrap_or(false),
        country: result.country,
        ig_username: result.ig_username,
        ig_followers: result.ig_followers,
        ig_verification: result.ig_verification,
        verification: result.verification,
        fetch_time: Utc::now(),
    })
}

fn map_collated_result(result: WireCollatedResult) -> Option<Ad> {
    let id = value_to_string(result.ad_archive_id);
    if id.is_empty() {
        return None;
    }

    let snapshot = result.snapshot.unwrap_or_default();
    Some(Ad {
        id,
        page_id: value_to_string(result.page_id),
        page_name: result.page_name.unwrap_or_default(),
        title: snapshot.title,
        body: normalize_body(snapshot.body.as_ref()),
        caption: snapshot.caption,
        cta_text: snapshot.cta_text,
        cta_type: snapshot.cta_type,
        link_url: snapshot.link_url,
        image_url: snapshot.image_url,
        platforms: snapshot.publisher_platform,
        start_date: result.start_date,
        end_date: result.end_date,
        fetch_time: Utc::now(),
    })
}

/// Partition the location-audience list on the `excluded` flag and carry
/// the rest of the disclosure through.
fn map_targeting(aaa: &WireAaaInfo) -> Targeting {
    let mut locations = Vec::new();
    let mut excluded_locations = Vec::new();
    for location in aaa.location_audience.iter().flatten() {
        let name = location.name.clone().unwrap_or_default();
        if location.excluded {
            excluded_locations.push(name);
        } else {
            locations.push(name);
        }
    }

    Targeting {
        locations,
        excluded_locations,
        gender: aaa
            .gender_audience
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        age_range: aaa
            .age_audience
            .as_ref()
            .map(|age| AgeRange {
                min: age.min,
                max: age.max,
            })
            .unwrap_or_default(),
        eu_total_reach: aaa.eu_total_reach.clone().filter(|v| !v.is_null()),
        demographic_breakdown: aaa.age_country_gender_reach_breakdown.clone(),
    }
}

fn map_ad_detail(archive_id: &str, page_id: &str, details: WireAdDetails) -> AdDetail {
    let advertiser_page = details
        .advertiser
        .and_then(|a| a.ad_library_page_info)
        .unwrap_or_default();
    let aaa = details.aaa_info.unwrap_or_default();

    let targeting = map_targeting(&aaa);

    // Spend is only disclosed per-disclaimer; take the first entry when the
    // list is non-empty, otherwise leave it absent.
    let spend = advertiser_page
        .page_spend
        .as_ref()
        .and_then(|s| s.lifetime_by_disclaimer.first())
        .and_then(|d| d.get("spend"))
        .cloned()
        .filter(|v| !v.is_null());

    let ad = AdInfo {
        archive_id: archive_id.to_string(),
        page_id: page_id.to_string(),
        spend,
        is_political: advertiser_page
            .page_spend
            .as_ref()
            .map(|s| s.is_political_page)
            .unwrap_or(false),
        targeting,
        payer_beneficiary: aaa.payer_beneficiary_data,
        is_taken_down: aaa.is_ad_taken_down,
        has_violations: aaa.has_violating_payer_beneficiary,
    };

    let page = PageInfo {
        name: advertiser_page.page_name.unwrap_or_default(),
        category: advertiser_page.page_category.unwrap_or_default(),
        about: advertiser_page.page_about,
        verification: advertiser_page.page_verification.unwrap_or_default(),
        profile_url: advertiser_page.page_profile_uri,
        likes: advertiser_page.page_like_count.unwrap_or(0),
    };

    AdDetail {
        ad,
        page,
        fetch_time: Utc::now(),
    }
}

// ============================================================================
// Tests
// ============================================================================
