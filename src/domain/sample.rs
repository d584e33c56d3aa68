use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped position fix. Immutable once captured; it leaves the
/// system only through FIFO eviction or a confirmed upload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "createdDateTime", with = "iso8601")]
    pub captured_at: DateTime<Utc>,
}

impl Sample {
    pub fn new(latitude: f64, longitude: f64, captured_at: DateTime<Utc>) -> Self {
        Sample {
            latitude,
            longitude,
            captured_at,
        }
    }
}

// The ingestion endpoint expects ISO-8601 with fractional seconds and a 'Z'
// offset. The persisted buffer reuses the same representation.
mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&value)
            .map(|datetime| datetime.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
