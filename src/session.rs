use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

lazy_static! {
    static ref RE_DTSG: Regex = Regex::new(r#""DTSGInitData",\[\],\{"token":"([^"]+)""#).unwrap();
    static ref RE_CLIENT_REVISION: Regex = Regex::new(r#""client_revision":(\d+),"#).unwrap();
    static ref RE_LSD: Regex = Regex::new(r#""LSD",\[\],\{"token":"([^"]+)""#).unwrap();
    static ref RE_HASTE_SESSION: Regex = Regex::new(r#""haste_session":"([^"]+)""#).unwrap();
    static ref RE_SPIN_R: Regex = Regex::new(r#""__spin_r":(\d+),"#).unwrap();
    static ref RE_SPIN_B: Regex = Regex::new(r#""__spin_b":"([^"]+)""#).unwrap();
}

/// Transient tokens scraped out of the Ad Library landing page, plus the
/// request counter. Owned by exactly one client; the bootstrap fills the
/// token fields, the signer advances the counter.
#[derive(Debug, Clone, Default)]
pub struct SessionTokens {
    pub fb_dtsg: Option<String>,
    pub lsd: Option<String>,
    pub haste_session: Option<String>,
    pub client_revision: Option<String>,
    pub spin_r: Option<String>,
    pub spin_b: Option<String>,
    pub req_counter: u32,
}

impl SessionTokens {
    /// Scan the landing-page HTML for the six embedded tokens. Each
    /// extraction stands on its own: one pattern failing to match leaves
    /// only its field unset.
    pub fn from_html(body: &str) -> Self {
        let capture = |re: &Regex| {
            re.captures(body)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };

        let tokens = Self {
            fb_dtsg: capture(&RE_DTSG),
            lsd: capture(&RE_LSD),
            haste_session: capture(&RE_HASTE_SESSION),
            client_revision: capture(&RE_CLIENT_REVISION),
            spin_r: capture(&RE_SPIN_R),
            spin_b: capture(&RE_SPIN_B),
            req_counter: 0,
        };

        // Log presence only. Token values are session secrets and must not
        // end up in log files.
        info!(
            fb_dtsg = tokens.fb_dtsg.is_some(),
            lsd = tokens.lsd.is_some(),
            haste_session = tokens.haste_session.is_some(),
            client_revision = tokens.client_revision.is_some(),
            spin_r = tokens.spin_r.is_some(),
            spin_b = tokens.spin_b.is_some(),
            "Extracted session tokens from landing page"
        );
        if tokens.fb_dtsg.is_none() || tokens.lsd.is_none() {
            warn!("Landing page yielded no security tokens; requests will carry empty substitutions");
        }

        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = concat!(
        r#"requireLazy(["Bootloader"]);["DTSGInitData",[],{"token":"NAcO2yOFbaT:29:17","async_get_token":"x"}];"#,
        r#"{"consistency":{"rev":1020030405},"client_revision":1020030405,"tier":""};"#,
        r#"["LSD",[],{"token":"1oMsaEuqGqy53uwEmB0Ecv"}];"#,
        r#"{"haste_session":"20126.HYP:comet_pkg","haste_site":"www"};"#,
        r#"{"__spin_r":1020030405,"__spin_b":"trunk","__spin_t":1699733852,"#,
    );

    #[test]
    fn test_extracts_all_six_tokens() {
        let tokens = SessionTokens::from_html(SAMPLE);
        assert_eq!(tokens.fb_dtsg.as_deref(), Some("NAcO2yOFbaT:29:17"));
        assert_eq!(tokens.lsd.as_deref(), Some("1oMsaEuqGqy53uwEmB0Ecv"));
        assert_eq!(tokens.haste_session.as_deref(), Some("20126.HYP:comet_pkg"));
        assert_eq!(tokens.client_revision.as_deref(), Some("1020030405"));
        assert_eq!(tokens.spin_r.as_deref(), Some("1020030405"));
        assert_eq!(tokens.spin_b.as_deref(), Some("trunk"));
        assert_eq!(tokens.req_counter, 0);
    }

    #[test]
    fn test_extractions_are_independent() {
        // Only two of the six patterns present; the rest stay unset.
        let body = r#"["LSD",[],{"token":"abc"}]; {"__spin_b":"trunk","x":1}"#;
        let tokens = SessionTokens::from_html(body);
        assert_eq!(tokens.lsd.as_deref(), Some("abc"));
        assert_eq!(tokens.spin_b.as_deref(), Some("trunk"));
        assert!(tokens.fb_dtsg.is_none());
        assert!(tokens.haste_session.is_none());
        assert!(tokens.client_revision.is_none());
        assert!(tokens.spin_r.is_none());
    }

    #[test]
    fn test_empty_body_yields_empty_tokens() {
        let tokens = SessionTokens::from_html("");
        assert!(tokens.fb_dtsg.is_none());
        assert!(tokens.lsd.is_none());
        assert!(tokens.spin_r.is_none());
    }
}
