use chrono::Utc;
use rand::Rng;

use crate::session::SessionTokens;

/// Fallback checksum when no security token was extracted.
const JAZOEST_FALLBACK: &str = "25730";

/// Feature-flag blob replayed verbatim from a captured browser session. The
/// service only checks its presence and rough shape.
const DYN_BLOB: &str = "7xeUmwlECdwn8K2Wmh0no6u5U4e1Fx-ewSAwHwNw9G2S2q0_EtxG4o0B-qbwgE1EEb87C1xwEwgo9oO0n24oaEd86a3a1YwBgao6C0Mo6i588Etw8WfK1LwPxe2GewbCXwJwmEtwse5o4q0HU1IEGdw46wbLwrU6C2-0VE6O1Fw59G2O1TwmUaE2Two8";

const CSR_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Next request-sequence letter: `a`, `b`, ... `z`, then wrapping back to
/// `a`. The counter is monotonic for the life of the session.
fn next_req_id(tokens: &mut SessionTokens) -> String {
    let letter = (b'a' + (tokens.req_counter % 26) as u8) as char;
    tokens.req_counter += 1;
    letter.to_string()
}

/// Session string: fixed `::` prefix plus a fresh 8-hex-digit suffix.
fn session_string() -> String {
    format!("::{:08x}", rand::rng().random_range(0..=u32::MAX))
}

/// 32 random lowercase-alphanumeric characters, fresh per request.
fn csr_token() -> String {
    let mut rng = rand::rng();
    (0..32)
        .map(|_| CSR_ALPHABET[rng.random_range(0..CSR_ALPHABET.len())] as char)
        .collect()
}

/// Checksum over the security token: the digit `2` followed by the decimal
/// sum of the token's character codes.
fn jazoest(fb_dtsg: Option<&str>) -> String {
    match fb_dtsg {
        Some(token) => {
            let sum: u32 = token.chars().map(|c| c as u32).sum();
            format!("2{}", sum)
        }
        None => JAZOEST_FALLBACK.to_string(),
    }
}

/// Produce the signing fields accompanying every GraphQL call. Every key is
/// always present; unknown session state degrades to an empty string so that
/// request composition itself can never fail.
pub fn signing_params(tokens: &mut SessionTokens) -> Vec<(&'static str, String)> {
    let now = Utc::now();
    let blank = || String::new();

    vec![
        ("av", "0".to_string()),
        ("__aaid", "0".to_string()),
        ("__user", "0".to_string()),
        ("__a", "1".to_string()),
        ("__req", next_req_id(tokens)),
        ("__hs", tokens.haste_session.clone().unwrap_or_else(blank)),
        ("dpr", "2".to_string()),
        ("__ccg", "EXCELLENT".to_string()),
        ("__rev", tokens.client_revision.clone().unwrap_or_else(blank)),
        ("__s", session_string()),
        ("__hsi", now.timestamp_millis().to_string()),
        ("__dyn", DYN_BLOB.to_string()),
        ("__csr", csr_token()),
        ("__comet_req", "1".to_string()),
        ("lsd", tokens.lsd.clone().unwrap_or_else(blank)),
        ("jazoest", jazoest(tokens.fb_dtsg.as_deref())),
        ("__spin_r", tokens.spin_r.clone().unwrap_or_else(blank)),
        ("__spin_b", tokens.spin_b.clone().unwrap_or_else(blank)),
        ("__spin_t", now.timestamp().to_string()),
    ]
}
