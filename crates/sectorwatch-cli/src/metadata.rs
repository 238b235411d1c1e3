use std::fmt::{Display, Formatter};

use sectorwatch_core::{DateRange, ProviderId};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

/// Request identifier (UUID v4) attached to every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Context printed above every result.
///
/// Field order is fixed to keep JSON output stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub request_id: RequestId,
    pub generated_at: String,
    pub source: ProviderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<DateRange>,
    pub latency_ms: u64,
    /// Every close series came from the cache; no upstream request was made.
    pub cache_hit: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<String>,
}

impl Metadata {
    pub fn new(source: ProviderId) -> Result<Self, time::error::Format> {
        Ok(Self {
            request_id: RequestId::new_v4(),
            generated_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
            source,
            window: None,
            latency_ms: 0,
            cache_hit: false,
            warnings: Vec::new(),
            exports: Vec::new(),
        })
    }

    pub fn with_window(mut self, window: DateRange) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn push_export(&mut self, path: impl Into<String>) {
        self.exports.push(path.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_uuid_v4() {
        let request_id = RequestId::new_v4();
        assert_eq!(request_id.0.get_version_num(), 4);
    }

    #[test]
    fn generated_at_is_rfc3339_utc() {
        let metadata = Metadata::new(ProviderId::Synthetic).expect("timestamp formats");
        assert!(OffsetDateTime::parse(&metadata.generated_at, &Rfc3339).is_ok());
        assert!(metadata.generated_at.ends_with('Z'));
    }

    #[test]
    fn empty_lists_are_omitted_from_json() {
        let metadata = Metadata::new(ProviderId::Yahoo).expect("timestamp formats");
        let json = serde_json::to_value(&metadata).expect("serializes");
        assert_eq!(json["source"], "yahoo");
        assert!(json.get("warnings").is_none());
        assert!(json.get("window").is_none());
        assert_eq!(json["cache_hit"], false);
    }
}
