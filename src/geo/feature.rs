// =============================================================================
// FEATURE — Le modèle de données GeoJSON partagé
// =============================================================================
//
// Une FeatureCollection est une séquence ORDONNÉE de Features. L'ordre
// d'insertion est préservé de bout en bout : ni la classification ni le
// filtrage ne réordonnent.
//
//   Feature {
//       id         : string
//       geometry   : Point | Polygon | MultiPolygon
//       properties : string → scalaire JSON ou null
//   }
//
// Une position est [longitude, latitude, ...] : les flux sismiques ajoutent
// la profondeur en troisième coordonnée, on ne garde que les deux premières
// pour la géométrie plane.
//
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// [longitude, latitude, éventuellement profondeur]
pub type Position = Vec<f64>;

/// Un anneau : positions ordonnées, fermé (premier == dernier)
pub type RingPositions = Vec<Position>;

/// Propriétés d'une feature : nom → scalaire JSON ou null
pub type Properties = Map<String, Value>;

/// Noms des propriétés lues ou posées par l'enrichissement
pub mod props {
    pub const TIME: &str = "time";
    pub const REGION: &str = "region";
    pub const HIDE: &str = "hide";
    pub const YEAR: &str = "year";
    pub const MONTH: &str = "month";
    pub const DAY: &str = "day";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    Polygon { coordinates: Vec<RingPositions> },
    MultiPolygon { coordinates: Vec<Vec<RingPositions>> },
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: vec![lon, lat],
        }
    }

    pub fn polygon(rings: Vec<RingPositions>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureTag {
    #[default]
    Feature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionTag {
    #[default]
    FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub tag: FeatureTag,
    /// Les polygones de pays n'ont pas toujours d'identifiant ; absent et
    /// vide ("") restent distincts à la réécriture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    pub fn new(id: &str, geometry: Geometry) -> Self {
        Feature {
            tag: FeatureTag::Feature,
            id: Some(id.to_string()),
            geometry,
            properties: Properties::new(),
        }
    }

    /// Ajoute une propriété (style builder, pratique dans les tests et hôtes)
    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Identifiant, "" s'il est absent
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn set_property(&mut self, key: &str, value: impl Into<Value>) {
        self.properties.insert(key.to_string(), value.into());
    }

    /// Nom de région posé par la classification
    pub fn region(&self) -> Option<&str> {
        self.property(props::REGION).and_then(Value::as_str)
    }

    /// Drapeau de masquage ; `None` si absent ou non booléen
    pub fn hidden(&self) -> Option<bool> {
        self.property(props::HIDE).and_then(Value::as_bool)
    }

    /// Horodatage en millisecondes depuis l'époque Unix
    pub fn time_millis(&self) -> Option<i64> {
        let time = self.property(props::TIME)?;
        time.as_i64().or_else(|| {
            time.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.floor() as i64)
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub tag: CollectionTag,
    #[serde(default)]
    pub features: Vec<Feature>,
    /// Membres de premier niveau non modélisés (metadata, bbox...) : recopiés
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        FeatureCollection {
            tag: CollectionTag::FeatureCollection,
            features,
            extra: Map::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}
