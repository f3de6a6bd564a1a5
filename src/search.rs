use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A single address match, shaped as a GeoJSON Feature. Members the service leaves out
/// decode as empty values rather than failing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: SearchResultProperties,
}

impl SearchResult {
    pub fn longitude(&self) -> Option<f64> {
        self.coordinate(0)
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinate(1)
    }

    fn coordinate(&self, index: usize) -> Option<f64> {
        self.geometry.as_ref()?.coordinates.get(index).copied()
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.properties.label)?;
        if let (Some(longitude), Some(latitude)) = (self.longitude(), self.latitude()) {
            write!(f, " ({longitude}, {latitude})")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub r#type: String,
    /// Longitude then latitude, possibly followed by altitude.
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultProperties {
    #[serde(default)]
    pub label: String,
    /// The kind of match, e.g. `housenumber` or `street`. Kept as the service sends it.
    #[serde(default)]
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Accuracy in metres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housenumber: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citycode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The body returned by the search endpoint, shaped as a GeoJSON FeatureCollection.
/// Only `type` and `features` are required; everything else is passed through as sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub r#type: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licence: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Value>,
    #[serde(default)]
    pub query: String,
    pub features: Vec<SearchResult>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResults {
    pub fn is_feature_collection(&self) -> bool {
        self.r#type == "FeatureCollection"
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "type": "FeatureCollection",
            "version": "draft",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-2.154513, 47.267305]},
                "properties": {
                    "label": "8 Boulevard du Port 44380 Pornichet",
                    "score": 0.49,
                    "housenumber": "8",
                    "id": "44132_0480_00008",
                    "name": "8 Boulevard du Port",
                    "postcode": "44380",
                    "citycode": "44132",
                    "x": 295283.45,
                    "y": 6698920.59,
                    "city": "Pornichet",
                    "context": "44, Loire-Atlantique, Pays de la Loire",
                    "type": "housenumber",
                    "importance": 0.53,
                    "street": "Boulevard du Port"
                }
            }],
            "attribution": "BAN",
            "licence": "ETALAB-2.0",
            "query": "8 bd du port",
            "limit": 1
        })
    }

    #[test]
    fn decodes_service_body() {
        let results: SearchResults = serde_json::from_value(sample()).unwrap();
        assert!(results.is_feature_collection());
        assert_eq!(results.len(), 1);
        assert_eq!(results.licence, Some(json!("ETALAB-2.0")));
        assert_eq!(results.extra.get("limit"), Some(&json!(1)));

        let result = &results.features[0];
        assert_eq!(result.properties.r#type, "housenumber");
        assert_eq!(result.properties.city.as_deref(), Some("Pornichet"));
        assert_eq!(result.properties.extra.get("importance"), Some(&json!(0.53)));
        assert_eq!(result.longitude(), Some(-2.154513));
        assert_eq!(result.latitude(), Some(47.267305));
        assert_eq!(
            result.to_string(),
            "8 Boulevard du Port 44380 Pornichet (-2.154513, 47.267305)"
        );
    }

    #[test]
    fn passes_unknown_members_through() {
        let results: SearchResults = serde_json::from_value(sample()).unwrap();
        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value, sample());
    }

    #[test]
    fn minimal_collection_decodes() {
        let results: SearchResults =
            serde_json::from_value(json!({"type": "FeatureCollection", "features": []})).unwrap();
        assert!(results.is_feature_collection());
        assert!(results.is_empty());
        assert_eq!(results.version, "");
        assert_eq!(results.query, "");
    }

    #[test]
    fn sparse_features_decode() {
        let results: SearchResults = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature"},
                {"geometry": {"type": "Point", "coordinates": [2.35, 48.85, 35.0]},
                 "properties": {"label": "Paris"}}
            ]
        }))
        .unwrap();
        let bare = &results.features[0];
        assert_eq!(bare.longitude(), None);
        assert_eq!(bare.properties.label, "");
        assert_eq!(bare.to_string(), "");

        let paris = &results.features[1];
        assert_eq!(paris.latitude(), Some(48.85));
        assert_eq!(paris.properties.r#type, "");
        assert_eq!(paris.to_string(), "Paris (2.35, 48.85)");
    }

    #[test]
    fn requires_a_collection_shape() {
        for body in [
            json!([1, 2]),
            json!("FeatureCollection"),
            json!({"type": "FeatureCollection"}),
            json!({"features": []}),
        ] {
            assert!(serde_json::from_value::<SearchResults>(body).is_err());
        }
    }

    #[test]
    fn licence_may_be_an_object() {
        let mut body = sample();
        body["licence"] = json!({"ban": "ETALAB-2.0", "osm": "ODbL"});
        let results: SearchResults = serde_json::from_value(body).unwrap();
        assert_eq!(results.licence.unwrap()["osm"], "ODbL");
    }
}
