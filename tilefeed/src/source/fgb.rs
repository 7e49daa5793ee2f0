//! FlatGeobuf feature source.

use flatgeobuf::{AsyncFeatureIter, FgbFeature, HttpFgbReader};
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use geozero::geojson::GeoJsonWriter;
use geozero::{ColumnValue, FeatureProperties, GeozeroGeometry, PropertyProcessor};
use serde_json::{Map, Value};

use super::{FeatureSource, FeatureStream, SourceError};
use crate::coord::BBox;
use crate::feature::Feature;

/// Feature source reading a remote `.fgb` file.
///
/// Each query opens the file over HTTP range requests, searches its packed
/// R-tree for the query rectangle and decodes matching features one at a
/// time as the stream is polled. Only the header, the index pages that are
/// touched and the selected features are downloaded.
#[derive(Debug, Default, Clone, Copy)]
pub struct FgbSource;

impl FgbSource {
    pub fn new() -> Self {
        Self
    }
}

fn fgb_error(e: impl std::fmt::Display) -> SourceError {
    SourceError::Fgb(e.to_string())
}

async fn open_selection(url: String, bbox: BBox) -> Result<AsyncFeatureIter, SourceError> {
    tracing::debug!(url = %url, bbox = %bbox, "Opening FlatGeobuf selection");

    HttpFgbReader::open(&url)
        .await
        .map_err(fgb_error)?
        .select_bbox(bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y)
        .await
        .map_err(fgb_error)
}

/// Pull decoded features out of a selection until it is exhausted.
fn decode_selection(
    selection: AsyncFeatureIter,
) -> impl Stream<Item = Result<Feature, SourceError>> {
    stream::try_unfold(selection, |mut selection| async move {
        let next = match selection.next().await.map_err(fgb_error)? {
            Some(feature) => Some(to_feature(feature)?),
            None => None,
        };
        Ok(next.map(|feature| (feature, selection)))
    })
}

/// Convert one FlatGeobuf feature into a GeoJSON feature.
fn to_feature(feature: &FgbFeature) -> Result<Feature, SourceError> {
    let geometry = if feature.geometry().is_some() {
        let mut out = Vec::new();
        feature
            .process_geom(&mut GeoJsonWriter::new(&mut out))
            .map_err(fgb_error)?;
        serde_json::from_slice(&out).map_err(|e| SourceError::Malformed(e.to_string()))?
    } else {
        Value::Null
    };

    let mut properties = JsonProperties::default();
    feature
        .process_properties(&mut properties)
        .map_err(fgb_error)?;

    Ok(Feature::new(geometry, properties.0))
}

/// Collects typed column values into a JSON object.
#[derive(Default)]
struct JsonProperties(Map<String, Value>);

impl PropertyProcessor for JsonProperties {
    fn property(
        &mut self,
        _idx: usize,
        name: &str,
        value: &ColumnValue,
    ) -> geozero::error::Result<bool> {
        self.0.insert(name.to_string(), column_to_json(value));
        Ok(false)
    }
}

fn column_to_json(value: &ColumnValue) -> Value {
    match value {
        ColumnValue::Bool(v) => Value::from(*v),
        ColumnValue::Byte(v) => Value::from(*v),
        ColumnValue::UByte(v) => Value::from(*v),
        ColumnValue::Short(v) => Value::from(*v),
        ColumnValue::UShort(v) => Value::from(*v),
        ColumnValue::Int(v) => Value::from(*v),
        ColumnValue::UInt(v) => Value::from(*v),
        ColumnValue::Long(v) => Value::from(*v),
        ColumnValue::ULong(v) => Value::from(*v),
        ColumnValue::Float(v) => Value::from(f64::from(*v)),
        ColumnValue::Double(v) => Value::from(*v),
        ColumnValue::String(v) | ColumnValue::DateTime(v) => Value::from(*v),
        ColumnValue::Json(v) => {
            serde_json::from_str(v).unwrap_or_else(|_| Value::from(*v))
        }
        _ => Value::Null,
    }
}

impl FeatureSource for FgbSource {
    fn query(&self, url: &str, bbox: BBox) -> FeatureStream {
        stream::once(open_selection(url.to_string(), bbox))
            .map_ok(decode_selection)
            .try_flatten()
            .boxed()
    }

    fn name(&self) -> &'static str {
        "flatgeobuf"
    }
}
