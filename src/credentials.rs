use serde::{Deserialize, Serialize};

use crate::error::{AdLensError, Result};

/// A single cookie from an externally supplied browser export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: bool,
}

/// Ordered cookie bundle. Order is preserved so the Cookie header reads the
/// same as the export it came from.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse cookies from the formats operators actually have at hand:
    /// - JSON array (EditThisCookie export)
    /// - Netscape format (cookies.txt)
    /// - Header string (`key=value; key2=value2`, optional `Cookie:` prefix)
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Ok(Self::new());
        }

        if trimmed.starts_with('[') {
            Self::parse_json(trimmed)
        } else if trimmed.contains('\t') || trimmed.starts_with('#') {
            Self::parse_netscape(trimmed)
        } else {
            Self::parse_header_string(trimmed)
        }
    }

    fn parse_json(input: &str) -> Result<Self> {
        let entries: Vec<serde_json::Value> =
            serde_json::from_str(input).map_err(|e| AdLensError::InvalidJson(e.to_string()))?;

        let mut jar = Self::new();
        for entry in entries {
            let name = entry
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            jar.insert(Cookie {
                name: name.to_string(),
                value: entry
                    .get("value")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                domain: entry.get("domain").and_then(|v| v.as_str()).map(String::from),
                path: entry.get("path").and_then(|v| v.as_str()).map(String::from),
                secure: entry.get("secure").and_then(|v| v.as_bool()).unwrap_or(false),
            });
        }
        Ok(jar)
    }

    /// Netscape line format: domain\tflag\tpath\tsecure\texpiry\tname\tvalue
    fn parse_netscape(input: &str) -> Result<Self> {
        let mut jar = Self::new();
        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < 7 || parts[5].is_empty() {
                continue;
            }
            jar.insert(Cookie {
                name: parts[5].to_string(),
                value: parts[6].to_string(),
                domain: Some(parts[0].to_string()),
                path: Some(parts[2].to_string()),
                secure: parts[3].eq_ignore_ascii_case("true"),
            });
        }
        Ok(jar)
    }

    fn parse_header_string(input: &str) -> Result<Self> {
        let cookie_str = if input.len() >= 7 && input[..7].eq_ignore_ascii_case("cookie:") {
            input[7..].trim()
        } else {
            input
        };

        let mut jar = Self::new();
        for pair in cookie_str.split(';') {
            let pair = pair.trim();
            if let Some(idx) = pair.find('=') {
                let name = pair[..idx].trim();
                if name.is_empty() {
                    continue;
                }
                jar.insert(Cookie {
                    name: name.to_string(),
                    value: pair[idx + 1..].trim().to_string(),
                    domain: None,
                    path: None,
                    secure: false,
                });
            }
        }
        Ok(jar)
    }

    /// Render as a Cookie header value.
    pub fn to_header_string(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// Insert a cookie, replacing an existing cookie with the same name in place.
    pub fn insert(&mut self, cookie: Cookie) {
        match self.cookies.iter_mut().find(|c| c.name == cookie.name) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }
}

/// Everything the client needs to look authenticated to the Ad Library.
/// Supplied by the caller; the library never reads credentials from the
/// environment or compiles them in.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub cookies: CookieJar,
}

impl Credentials {
    pub fn new(cookies: CookieJar) -> Self {
        Self { cookies }
    }

    /// Build from any supported cookie-export format.
    pub fn parse(input: &str) -> Result<Self> {
        Ok(Self {
            cookies: CookieJar::parse(input)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}
