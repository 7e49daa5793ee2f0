//! Feature accumulation with identity deduplication.

use std::collections::HashSet;

use super::{Feature, FeatureCollection, IdentityKey};

/// Outcome of one accumulation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulateReport {
    /// Features consumed from the input.
    pub received: usize,
    /// Features appended to the collection.
    pub added: usize,
    /// Features dropped because their identity was already held.
    pub duplicates: usize,
    /// Features whose identity property was missing or null.
    pub missing_identity: usize,
}

/// Append-only collection of distinct features.
///
/// Every feature in the collection has a unique identity, and the seen set
/// holds exactly the identities present in the collection.
#[derive(Debug, Clone)]
pub struct FeatureAccumulator {
    id_property: String,
    collection: FeatureCollection,
    seen: HashSet<IdentityKey>,
}

impl FeatureAccumulator {
    /// Create an empty accumulator keyed on `id_property`.
    pub fn new(id_property: impl Into<String>) -> Self {
        Self {
            id_property: id_property.into(),
            collection: FeatureCollection::new(),
            seen: HashSet::new(),
        }
    }

    /// Consume `features` in order, appending those with unseen identities.
    pub fn accumulate<I>(&mut self, features: I) -> AccumulateReport
    where
        I: IntoIterator<Item = Feature>,
    {
        let mut report = AccumulateReport::default();

        for feature in features {
            report.received += 1;

            let key = feature.identity(&self.id_property);
            if key.is_missing() {
                report.missing_identity += 1;
            }

            if self.seen.insert(key) {
                self.collection.features.push(feature);
                report.added += 1;
            } else {
                report.duplicates += 1;
            }
        }

        if report.missing_identity > 0 {
            tracing::warn!(
                id_property = %self.id_property,
                count = report.missing_identity,
                "Features without an identity value share one identity; only the first is kept"
            );
        }

        report
    }

    /// The accumulated collection, in first-seen order.
    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// Whether a feature with this identity is held.
    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Property used as the identity key.
    pub fn id_property(&self) -> &str {
        &self.id_property
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn feature(props: Value) -> Feature {
        let Value::Object(properties) = props else {
            panic!("properties must be an object");
        };
        Feature::new(json!({"type": "Point", "coordinates": [0.0, 0.0]}), properties)
    }

    fn ids(acc: &FeatureAccumulator) -> Vec<Value> {
        acc.collection()
            .features
            .iter()
            .map(|f| f.properties["id"].clone())
            .collect()
    }

    #[test]
    fn test_duplicate_identity_dropped() {
        let mut acc = FeatureAccumulator::new("id");
        let report = acc.accumulate(vec![
            feature(json!({"id": 1})),
            feature(json!({"id": 2})),
            feature(json!({"id": 1})),
        ]);

        assert_eq!(ids(&acc), vec![json!(1), json!(2)]);
        assert_eq!(
            report,
            AccumulateReport {
                received: 3,
                added: 2,
                duplicates: 1,
                missing_identity: 0,
            }
        );
    }

    #[test]
    fn test_first_seen_wins() {
        let mut acc = FeatureAccumulator::new("id");
        acc.accumulate(vec![feature(json!({"id": "a", "v": 1}))]);
        acc.accumulate(vec![feature(json!({"id": "a", "v": 2}))]);

        assert_eq!(acc.len(), 1);
        assert_eq!(acc.collection().features[0].properties["v"], json!(1));
    }

    #[test]
    fn test_dedup_across_passes_keeps_order() {
        let mut acc = FeatureAccumulator::new("id");
        acc.accumulate(vec![feature(json!({"id": 3})), feature(json!({"id": 1}))]);
        let report = acc.accumulate(vec![
            feature(json!({"id": 1})),
            feature(json!({"id": 2})),
        ]);

        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(ids(&acc), vec![json!(3), json!(1), json!(2)]);
    }

    #[test]
    fn test_float_and_integer_ids_are_one_feature() {
        let mut acc = FeatureAccumulator::new("id");
        acc.accumulate(vec![feature(json!({"id": 1}))]);
        let report = acc.accumulate(vec![
            feature(json!({"id": 1.0})),
            feature(json!({"id": 2.5})),
        ]);

        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(ids(&acc), vec![json!(1), json!(2.5)]);
    }

    #[test]
    fn test_missing_identities_collapse_to_one() {
        let mut acc = FeatureAccumulator::new("id");
        let report = acc.accumulate(vec![
            feature(json!({"name": "x"})),
            feature(json!({"id": null})),
            feature(json!({"id": 5})),
        ]);

        assert_eq!(acc.len(), 2);
        assert_eq!(report.missing_identity, 2);
        assert_eq!(report.duplicates, 1);
        assert!(acc.contains(&IdentityKey::Missing));
    }

    #[test]
    fn test_seen_set_matches_collection() {
        let mut acc = FeatureAccumulator::new("fid");
        acc.accumulate((0..50).map(|i| {
            let mut props = Map::new();
            props.insert("fid".to_string(), json!(i % 20));
            Feature::new(Value::Null, props)
        }));

        assert_eq!(acc.len(), 20);
        for f in &acc.collection().features {
            assert!(acc.contains(&f.identity("fid")));
        }
        assert!(!acc.contains(&IdentityKey::from(json!(20))));
    }

    #[test]
    fn test_empty_input() {
        let mut acc = FeatureAccumulator::new("id");
        let report = acc.accumulate(Vec::new());
        assert_eq!(report, AccumulateReport::default());
        assert!(acc.is_empty());
        assert_eq!(acc.id_property(), "id");
    }
}
