use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One media range from an `Accept` header, e.g. `application/json;version=v1;q=0.8`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaTypeEntry {
    /// Top-level type (`application`, `*`), lower-cased
    pub media_type: String,
    /// Subtype (`json`, `*`), lower-cased
    pub subtype: String,
    /// Quality factor, 1.0 when absent or unparsable
    pub quality: f64,
    /// Remaining parameters (`q` is lifted into `quality`)
    pub params: BTreeMap<String, String>,
    /// The entry as it appeared in the header, trimmed
    pub raw: String,
}

impl MediaTypeEntry {
    /// Parse a single media range. Returns `None` when there is no type.
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut parts = split_unquoted(raw, ';').into_iter();
        let (media_type, subtype) = split_media_type(parts.next()?)?;

        let mut quality = 1.0;
        let mut params = BTreeMap::new();
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim().trim_matches('"');
            if key.is_empty() {
                continue;
            }
            if key == "q" {
                quality = value.parse::<f64>().ok().filter(|q| q.is_finite()).unwrap_or(1.0);
            } else {
                params.insert(key, value.to_string());
            }
        }

        Some(Self {
            media_type,
            subtype,
            quality,
            params,
            raw: raw.to_string(),
        })
    }

    /// Look up a parameter such as `version`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Whether this entry is acceptable for a response of `media_type/subtype`.
    #[must_use]
    pub fn accepts(&self, media_type: &str, subtype: &str) -> bool {
        if self.media_type == "*" {
            self.subtype == "*" || self.subtype == subtype
        } else if media_type == "*" {
            subtype == "*" || self.subtype == subtype
        } else if self.media_type == media_type {
            subtype == "*" || self.subtype == "*" || self.subtype == subtype
        } else {
            false
        }
    }
}

/// Split on `sep` wherever it is not inside a double-quoted string.
/// A backslash inside quotes escapes the next character.
fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            c if c == sep && !quoted => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Split `type/subtype`; a bare type reads as `type/*`.
fn split_media_type(token: &str) -> Option<(String, String)> {
    let token = token.trim();
    let (media_type, subtype) = match token.split_once('/') {
        Some((t, s)) => (t.trim(), s.trim()),
        None => (token, "*"),
    };
    if media_type.is_empty() {
        return None;
    }
    let subtype = if subtype.is_empty() { "*" } else { subtype };
    Some((media_type.to_ascii_lowercase(), subtype.to_ascii_lowercase()))
}

/// Parsed `Accept` header, entries in client-preference order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceptHeader {
    entries: Vec<MediaTypeEntry>,
}

impl AcceptHeader {
    /// Parse a header value. Entries are stably sorted by descending quality,
    /// so equally weighted ranges keep the order the client sent them in.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let mut entries: Vec<MediaTypeEntry> = split_unquoted(header, ',')
            .into_iter()
            .filter(|e| !e.trim().is_empty())
            .filter_map(MediaTypeEntry::parse)
            .collect();
        entries.sort_by(|a, b| b.quality.partial_cmp(&a.quality).unwrap_or(Ordering::Equal));
        Self { entries }
    }

    /// Parse an optional header; a missing header behaves like an empty one.
    #[must_use]
    pub fn from_header(header: Option<&str>) -> Self {
        header.map(Self::parse).unwrap_or_default()
    }

    #[must_use]
    pub fn entries(&self) -> &[MediaTypeEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaTypeEntry> {
        self.entries.iter()
    }

    /// Entries compatible with `content_type`, in preference order.
    pub fn filter<'a>(&'a self, content_type: &str) -> impl Iterator<Item = &'a MediaTypeEntry> + 'a {
        let wanted = split_media_type(content_type);
        self.entries.iter().filter(move |entry| match &wanted {
            Some((media_type, subtype)) => entry.accepts(media_type, subtype),
            None => false,
        })
    }

    /// Entries compatible with `content_type` that also carry every
    /// `(name, value)` pair in `params`.
    pub fn filter_with<'a>(
        &'a self,
        content_type: &str,
        params: &'a [(&'a str, &'a str)],
    ) -> impl Iterator<Item = &'a MediaTypeEntry> + 'a {
        self.filter(content_type)
            .filter(move |entry| params.iter().all(|(name, value)| entry.param(name) == Some(*value)))
    }

    /// First non-empty `version` parameter among entries matching `content_type`.
    #[must_use]
    pub fn version(&self, content_type: &str) -> Option<&str> {
        self.filter(content_type)
            .find_map(|entry| entry.param("version").filter(|v| !v.is_empty()))
    }
}

impl<'a> IntoIterator for &'a AcceptHeader {
    type Item = &'a MediaTypeEntry;
    type IntoIter = std::slice::Iter<'a, MediaTypeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
