use std::fmt;

use url::Url;

const DEFAULT_SCHEME_PREFIX: &str = "http://";

/// An absolute `http`/`https` URL derived from user input.
///
/// `as_str` returns the text exactly as normalized (no trailing slash is
/// appended), while `url` exposes the parsed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    text: String,
    url: Url,
}

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Port used for the reachability probe and the request.
    pub fn port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or(80)
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRejection {
    Empty,
    /// No `.`, no `www` and no `://`: not worth a network round trip.
    Implausible,
    UnsupportedScheme(String),
    Malformed(String),
    MissingHost,
}

impl fmt::Display for InputRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputRejection::Empty => write!(f, "input is empty"),
            InputRejection::Implausible => write!(f, "input does not look like a url"),
            InputRejection::UnsupportedScheme(scheme) => {
                write!(f, "unsupported scheme {scheme}")
            }
            InputRejection::Malformed(reason) => write!(f, "malformed url: {reason}"),
            InputRejection::MissingHost => write!(f, "url has no host"),
        }
    }
}

/// Canonicalize raw user input into an absolute `http(s)` URL.
///
/// Pure: never touches the network.
pub fn normalize_input(raw: &str) -> Result<NormalizedUrl, InputRejection> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputRejection::Empty);
    }
    if !trimmed.contains('.') && !trimmed.contains("www") && !trimmed.contains("://") {
        return Err(InputRejection::Implausible);
    }

    let text = if has_http_prefix(trimmed) {
        trimmed.to_string()
    } else if let Some((scheme, _)) = trimmed.split_once("://") {
        return Err(InputRejection::UnsupportedScheme(scheme.to_string()));
    } else {
        format!("{DEFAULT_SCHEME_PREFIX}{trimmed}")
    };

    let url = Url::parse(&text).map_err(|err| InputRejection::Malformed(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(InputRejection::UnsupportedScheme(url.scheme().to_string()));
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(NormalizedUrl { text, url }),
        _ => Err(InputRejection::MissingHost),
    }
}

fn has_http_prefix(input: &str) -> bool {
    ["http://", "https://"].iter().any(|prefix| {
        input
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}
