//! HTTP feature source.

use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;

use super::{FeatureSource, FeatureStream, SourceError};
use crate::coord::BBox;
use crate::feature::{Feature, FeatureCollection};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Feature source for GeoJSON web services (WFS/OGC API style endpoints).
///
/// Each query is a single GET of `url` with a `bbox=minX,minY,maxX,maxY`
/// parameter appended. The response may be a GeoJSON FeatureCollection, a
/// single Feature, or newline-delimited features (GeoJSON text sequences
/// are accepted too). The body is read whole; features whose geometry does
/// not touch the query rectangle are dropped.
///
/// For FlatGeobuf files use [`FgbSource`](super::FgbSource).
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Creates a new HttpSource with default configuration.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new HttpSource with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SourceError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

/// Append the bbox parameter to `url`.
fn request_url(url: &str, bbox: &BBox) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}bbox={},{},{},{}",
        url, separator, bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
    )
}

async fn fetch(client: reqwest::Client, url: String) -> Result<Vec<Feature>, SourceError> {
    tracing::debug!(url = %url, "Fetching features");

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| SourceError::Http(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(SourceError::Status {
            status: response.status().as_u16(),
            url,
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| SourceError::Http(format!("Failed to read response: {}", e)))?;

    parse_features(&body)
}

/// Keep only features whose geometry extent touches `bbox`.
fn within(features: Vec<Feature>, bbox: &BBox) -> Vec<Feature> {
    features
        .into_iter()
        .filter(|f| f.geometry_bbox().is_some_and(|extent| extent.intersects(bbox)))
        .collect()
}

/// Decode a response body into features, in document order.
///
/// Accepts a FeatureCollection, a single Feature, or one feature per line
/// (blank lines and RFC 8142 record separators are skipped).
pub fn parse_features(body: &[u8]) -> Result<Vec<Feature>, SourceError> {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return match value.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => serde_json::from_value::<FeatureCollection>(value)
                .map(|fc| fc.features)
                .map_err(|e| SourceError::Malformed(e.to_string())),
            Some("Feature") => serde_json::from_value::<Feature>(value)
                .map(|f| vec![f])
                .map_err(|e| SourceError::Malformed(e.to_string())),
            other => Err(SourceError::Malformed(format!(
                "expected Feature or FeatureCollection, got {:?}",
                other
            ))),
        };
    }

    let text = std::str::from_utf8(body).map_err(|e| SourceError::Malformed(e.to_string()))?;
    text.lines()
        .map(|line| line.trim_matches(|c: char| c == '\u{1e}' || c.is_whitespace()))
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str::<Feature>(line)
                .map_err(|e| SourceError::Malformed(format!("record {}: {}", i + 1, e)))
        })
        .collect()
}

impl FeatureSource for HttpSource {
    fn query(&self, url: &str, bbox: BBox) -> FeatureStream {
        let client = self.client.clone();
        let url = request_url(url, &bbox);

        stream::once(fetch(client, url))
            .map_ok(move |features| {
                stream::iter(within(features, &bbox).into_iter().map(Ok::<Feature, SourceError>))
            })
            .try_flatten()
            .boxed()
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_url_appends_bbox() {
        let bbox = BBox::new(1.0, 2.5, 3.0, 4.0);
        assert_eq!(
            request_url("https://example.com/data", &bbox),
            "https://example.com/data?bbox=1,2.5,3,4"
        );
        assert_eq!(
            request_url("https://example.com/data?f=json", &bbox),
            "https://example.com/data?f=json&bbox=1,2.5,3,4"
        );
    }

    #[test]
    fn test_parse_feature_collection() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": null, "properties": {"id": 1}},
                {"type": "Feature", "geometry": null, "properties": {"id": 2}}
            ]
        })
        .to_string();

        let features = parse_features(body.as_bytes()).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[1].properties["id"], json!(2));
    }

    #[test]
    fn test_parse_single_feature() {
        let body = r#"{"type":"Feature","geometry":null,"properties":{"id":"x"}}"#;
        let features = parse_features(body.as_bytes()).unwrap();
        assert_eq!(features.len(), 1);
    }

    #[test]
    fn test_parse_newline_delimited() {
        let body = "\u{1e}{\"type\":\"Feature\",\"properties\":{\"id\":1}}\n\n\
                    {\"type\":\"Feature\",\"properties\":{\"id\":2}}\n";
        let features = parse_features(body.as_bytes()).unwrap();
        assert_eq!(features.len(), 2);
    }

    #[test]
    fn test_parse_rejects_other_json() {
        let result = parse_features(br#"{"type":"Point","coordinates":[0,0]}"#);
        assert!(matches!(result, Err(SourceError::Malformed(_))));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let result = parse_features(b"not json\n");
        assert!(matches!(result, Err(SourceError::Malformed(_))));
    }

    #[test]
    fn test_response_is_filtered_to_query_box() {
        let body = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[0.5,0.5]},"properties":{"id":1}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[5.0,5.0]},"properties":{"id":2}},
            {"type":"Feature","geometry":null,"properties":{"id":3}}
        ]}"#;
        let features = parse_features(body.as_bytes()).unwrap();

        let kept = within(features, &BBox::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].properties["id"], json!(1));
    }

    #[test]
    fn test_flatgeobuf_payload_is_not_geojson() {
        let result = parse_features(b"fgb\x03fgb\x00\x10\0\0\0\0\0\0\0");
        assert!(matches!(result, Err(SourceError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_query_is_lazy() {
        // Building the stream must not touch the network
        let source = HttpSource::new().unwrap();
        let _stream = source.query("http://127.0.0.1:9/unused", BBox::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(source.name(), "http");
    }
}
