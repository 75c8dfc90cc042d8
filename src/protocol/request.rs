//! Request Parsing
//!
//! Decodes the CSV body of an invocation and the optional ranking size
//! carried in the custom-attributes header.

use crate::error::{AttributeError, BodyError};
use crate::model::clamp_topn;
use serde::{Deserialize, Deserializer};
use tracing::debug;

/// The only body format the predictor accepts
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Header carrying a JSON object of per-request options, e.g. `{"topn": 10}`
pub const CUSTOM_ATTRIBUTES_HEADER: &str = "X-Amzn-SageMaker-Custom-Attributes";

/// Check a `Content-Type` value, ignoring parameters such as `charset`.
pub fn is_csv(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case(CSV_CONTENT_TYPE))
        .unwrap_or(false)
}

/// One query per CSV row, first column only, no header row.
pub fn parse_queries(body: &[u8]) -> Result<Vec<String>, BodyError> {
    let text = std::str::from_utf8(body)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut queries = Vec::new();
    for record in reader.records() {
        let record = record?;
        queries.push(record.get(0).unwrap_or_default().to_string());
    }

    Ok(queries)
}

#[derive(Debug, Deserialize)]
struct CustomAttributes {
    /// Outer `None`: key absent. Inner `None`: explicit `null`.
    #[serde(default, deserialize_with = "present")]
    topn: Option<Option<TopnValue>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<TopnValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<TopnValue>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TopnValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl TopnValue {
    fn to_integer(&self) -> Result<i64, AttributeError> {
        match self {
            TopnValue::Integer(n) => Ok(*n),
            TopnValue::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            TopnValue::Float(f) => Err(AttributeError::InvalidTopn(f.to_string())),
            TopnValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| AttributeError::InvalidTopn(s.clone())),
        }
    }
}

/// Extract `topn` from the custom-attributes header value.
///
/// `Ok(None)` means no header or an explicit `null`.
pub fn parse_topn(header: Option<&str>) -> Result<Option<i64>, AttributeError> {
    let Some(header) = header else {
        return Ok(None);
    };

    let attributes: CustomAttributes = serde_json::from_str(header)?;
    match attributes.topn {
        None => Err(AttributeError::MissingTopn),
        Some(None) => Ok(None),
        Some(Some(value)) => {
            let n = value.to_integer()?;
            if n < 1 {
                return Err(AttributeError::InvalidTopn(n.to_string()));
            }
            Ok(Some(n))
        }
    }
}

/// Ranking size for a request; never fails.
pub fn resolve_topn(header: Option<&str>) -> usize {
    match parse_topn(header) {
        Ok(requested) => clamp_topn(requested),
        Err(e) => {
            debug!(error = %e, "Custom attributes ignored, using default topn");
            clamp_topn(None)
        }
    }
}
