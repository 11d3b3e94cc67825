#![allow(dead_code)]

use axum::{
    extract::Form,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use tokio::{net::TcpListener, task::JoinHandle};

/// Landing page with the six embedded session tokens, shaped like the
/// inline script data the real page carries.
pub const LANDING_HTML: &str = concat!(
    "<!DOCTYPE html><html><head><title>Ad Library</title></head><body><script>",
    r#"requireLazy(["Bootloader"],function(){});["DTSGInitData",[],{"token":"TESTDTSG","async_get_token":"q"}];"#,
    r#"{"consistency":{"rev":1234567},"client_revision":1234567,"tier":""};"#,
    r#"["LSD",[],{"token":"TESTLSD"}];"#,
    r#"{"haste_session":"20126.HYP","haste_site":"www"};"#,
    r#"{"__spin_r":1234567,"__spin_b":"trunk","__spin_t":1699733852};"#,
    "</script></body></html>",
);

/// Minimal local mock of the Ad Library landing page + GraphQL endpoint.
///
/// Used by integration tests to ensure *no external network* is needed.
/// Every received form body is recorded for assertions on signing fields.
pub struct MockAdLibrary {
    pub base_url: String,
    received: Arc<Mutex<Vec<HashMap<String, String>>>>,
    _task: JoinHandle<()>,
}

impl MockAdLibrary {
    pub async fn start() -> Self {
        Self::start_inner(true).await
    }

    /// Landing page answers 500: bootstrap must degrade, operations must
    /// still go out with empty-token substitutions.
    pub async fn start_without_landing() -> Self {
        Self::start_inner(false).await
    }

    async fn start_inner(serve_landing: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock server");
        let addr: SocketAddr = listener
            .local_addr()
            .expect("failed to get mock server addr");
        let base_url = format!("http://{}", addr);

        let received: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::new(Mutex::new(Vec::new()));
        let received_for_handler = received.clone();

        let app = Router::new()
            .route(
                "/ads/library/",
                get(move || async move {
                    if serve_landing {
                        (StatusCode::OK, LANDING_HTML).into_response()
                    } else {
                        (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
                    }
                }),
            )
            .route(
                "/api/graphql/",
                post(move |Form(fields): Form<HashMap<String, String>>| {
                    let received = received_for_handler.clone();
                    async move {
                        received.lock().unwrap().push(fields.clone());
                        graphql_response(&fields)
                    }
                }),
            );

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server failed");
        });

        Self {
            base_url,
            received,
            _task: task,
        }
    }

    /// All form bodies received by the GraphQL endpoint, in order.
    pub fn received(&self) -> Vec<HashMap<String, String>> {
        self.received.lock().unwrap().clone()
    }
}

fn graphql_response(fields: &HashMap<String, String>) -> Response {
    let friendly = fields
        .get("fb_api_req_friendly_name")
        .cloned()
        .unwrap_or_default();
    let variables: Value = fields
        .get("variables")
        .and_then(|v| serde_json::from_str(v).ok())
        .unwrap_or_else(|| json!({}));

    let payload = match friendly.as_str() {
        "useAdLibraryTypeaheadSuggestionDataSourceQuery" => search_payload(),
        "AdLibrarySearchPaginationQuery" => {
            match variables.get("cursor").and_then(|c| c.as_str()) {
                None => ads_page_one(),
                Some("CURSOR1") => ads_page_two(),
                Some(_) => empty_connection(),
            }
        }
        "AdLibraryAdDetailsV2Query" => {
            if variables.get("adArchiveID").and_then(|v| v.as_str()) == Some("badjson") {
                // Truncated body: valid prefix, garbage JSON.
                return (StatusCode::OK, "for (;;);{not-json").into_response();
            }
            details_payload()
        }
        _ => json!({"data": null}),
    };

    (StatusCode::OK, format!("for (;;);{}", payload)).into_response()
}

fn search_payload() -> Value {
    json!({
        "data": {
            "ad_library_main": {
                "typeahead_suggestions": {
                    "page_results": [
                        {"name": "No Id Coffee"},
                        {
                            "page_id": "42",
                            "name": "Lelosi",
                            "category": "Clothing",
                            "entity_type": "PAGE",
                            "image_uri": "https://cdn.example/42.png",
                            "likes": 1200,
                            "page_alias": "lelosi",
                            "page_is_deleted": false,
                            "ig_username": "lelosi_ig",
                            "ig_followers": 5000,
                            "ig_verification": true,
                            "verification": "BLUE_VERIFIED"
                        }
                    ]
                }
            }
        }
    })
}

fn ads_page_one() -> Value {
    json!({
        "data": {
            "ad_library_main": {
                "search_results_connection": {
                    "edges": [
                        {
                            "node": {
                                "collated_results": [
                                    null,
                                    {
                                        "ad_archive_id": "1001",
                                        "page_id": "42",
                                        "page_name": "Lelosi",
                                        "start_date": 1699733852,
                                        "end_date": 1700000000,
                                        "snapshot": {
                                            "title": "Spring Sale",
                                            "body": {"text": "hello"},
                                            "caption": "lelosi.com",
                                            "cta_text": "Shop now",
                                            "cta_type": "SHOP_NOW",
                                            "link_url": "https://lelosi.com",
                                            "image_url": "https://cdn.example/ad1.jpg",
                                            "publisher_platform": ["FACEBOOK", "INSTAGRAM"]
                                        }
                                    }
                                ]
                            }
                        },
                        {
                            "node": {
                                "collated_results": [
                                    {
                                        "ad_archive_id": "1002",
                                        "page_id": "42",
                                        "page_name": "Lelosi",
                                        "snapshot": {"body": "plain text body"}
                                    }
                                ]
                            }
                        }
                    ],
                    "page_info": {"end_cursor": "CURSOR1", "has_next_page": true}
                }
            }
        }
    })
}

fn ads_page_two() -> Value {
    json!({
        "data": {
            "ad_library_main": {
                "search_results_connection": {
                    "edges": [
                        {
                            "node": {
                                "collated_results": [
                                    {
                                        "ad_archive_id": "1003",
                                        "page_id": "42",
                                        "page_name": "Lelosi",
                                        "snapshot": {}
                                    }
                                ]
                            }
                        }
                    ],
                    "page_info": {"end_cursor": null, "has_next_page": false}
                }
            }
        }
    })
}

fn empty_connection() -> Value {
    json!({
        "data": {
            "ad_library_main": {
                "search_results_connection": {
                    "edges": [],
                    "page_info": {"end_cursor": null, "has_next_page": false}
                }
            }
        }
    })
}

fn details_payload() -> Value {
    json!({
        "data": {
            "ad_library_main": {
                "ad_details": {
                    "advertiser": {
                        "ad_library_page_info": {
                            "page_name": "Lelosi",
                            "page_category": "Clothing",
                            "page_about": "Slovenian leggings brand",
                            "page_verification": "BLUE_VERIFIED",
                            "page_profile_uri": "https://example.com/lelosi",
                            "page_like_count": 1200,
                            "page_spend": {
                                "is_political_page": false,
                                "lifetime_by_disclaimer": [{"spend": "5000", "disclaimer": "Lelosi d.o.o."}]
                            }
                        }
                    },
                    "aaa_info": {
                        "location_audience": [
                            {"name": "US", "excluded": false},
                            {"name": "CN", "excluded": true}
                        ],
                        "gender_audience": "All",
                        "age_audience": {"min": 18, "max": 65},
                        "eu_total_reach": 123456,
                        "age_country_gender_reach_breakdown": [
                            {"country": "SI", "age_gender_breakdowns": []}
                        ],
                        "payer_beneficiary_data": [{"payer": "Lelosi d.o.o.", "beneficiary": "Lelosi"}],
                        "is_ad_taken_down": false,
                        "has_violating_payer_beneficiary": false
                    }
                }
            }
        }
    })
}
