// =============================================================================
// PIPELINE — JSON brut → données vérifiées → classification → filtre
// =============================================================================
//
// Le pont entre le moteur de schémas (core) et la classification (geo) :
//
//   texte JSON ──parse──▶ Value ──cast──▶ TypedValue ──▶ FeatureCollection
//                                                          │
//                      classify (région, hide, year, month, day)
//                                                          │
//   texte JSON ◀──uncast── Value ◀──────────────── FeatureCollection
//
// Aucune I/O ici : l'hôte lit les fichiers et passe les textes. Une
// erreur de cast est rendue telle quelle, c'est l'hôte qui décide de
// continuer avec un jeu vide ou d'abandonner.
//
// =============================================================================

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::config::ClassifierConfig;
use crate::core::cast::{cast, CastError};
use crate::core::catalog::{self, DEFAULT_REGION_PROPERTY, EVENT_COLLECTION, REGION_COLLECTION};
use crate::core::registry::SchemaRegistry;
use crate::core::typeside::TypedValue;
use crate::core::uncast::uncast;
use crate::core::validate::SchemaResolutionError;
use crate::geo::classify::{classify, ClassifyStats, LinearScan};
use crate::geo::feature::FeatureCollection;
use crate::geo::filter::{self, Filter};
use crate::geo::polygon::GeometryError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("JSON illisible : {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Cast(#[from] CastError),

    #[error("géométrie invalide : {0}")]
    Geometry(#[from] GeometryError),

    #[error("catalogue de schémas invalide : {0:?}")]
    Schema(Vec<SchemaResolutionError>),
}

/// Parse puis caste un texte JSON
pub fn from_json_str(registry: &SchemaRegistry, text: &str, schema: &str) -> Result<TypedValue, IngestError> {
    let raw: Value = serde_json::from_str(text)?;
    Ok(cast(registry, &raw, schema)?)
}

/// Uncaste puis sérialise (indentation de 2 espaces)
pub fn to_json_string(registry: &SchemaRegistry, value: &TypedValue, schema: &str) -> Result<String, IngestError> {
    let json = uncast(registry, value, schema)?;
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Valide un flux de séismes et le convertit en FeatureCollection
/// (propriétés sous leur nom interne, ex. `mag_type`).
pub fn ingest_events(registry: &SchemaRegistry, text: &str) -> Result<FeatureCollection, IngestError> {
    let typed = from_json_str(registry, text, EVENT_COLLECTION)?;
    let events: FeatureCollection = serde_json::from_value(typed.to_json())?;
    info!(features = events.len(), "flux de séismes validé");
    Ok(events)
}

/// Valide les polygones de région
pub fn ingest_regions(registry: &SchemaRegistry, text: &str) -> Result<FeatureCollection, IngestError> {
    let typed = from_json_str(registry, text, REGION_COLLECTION)?;
    let regions: FeatureCollection = serde_json::from_value(typed.to_json())?;
    info!(features = regions.len(), "polygones de région validés");
    Ok(regions)
}

/// Ressort une collection enrichie sous sa forme d'origine (`magType`...)
pub fn write_events(registry: &SchemaRegistry, events: &FeatureCollection) -> Result<String, IngestError> {
    let typed = TypedValue::from(serde_json::to_value(events)?);
    to_json_string(registry, &typed, EVENT_COLLECTION)
}

/// Les régions chargées et prêtes à classer, avec leur registre.
#[derive(Debug)]
pub struct QuakeMap {
    config: ClassifierConfig,
    /// Registre propre si la propriété de région n'est pas celle par défaut
    custom: Option<SchemaRegistry>,
    regions: FeatureCollection,
    locator: LinearScan,
}

impl QuakeMap {
    pub fn load(regions_text: &str, config: ClassifierConfig) -> Result<Self, IngestError> {
        let custom = if config.region_property == DEFAULT_REGION_PROPERTY {
            None
        } else {
            Some(catalog::build(&config.region_property).map_err(IngestError::Schema)?)
        };
        let registry = custom.as_ref().unwrap_or_else(|| catalog::builtin());
        let regions = ingest_regions(registry, regions_text)?;
        let locator = LinearScan::build(&regions, &config)?;
        Ok(QuakeMap {
            config,
            custom,
            regions,
            locator,
        })
    }

    pub fn registry(&self) -> &SchemaRegistry {
        self.custom.as_ref().unwrap_or_else(|| catalog::builtin())
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn regions(&self) -> &FeatureCollection {
        &self.regions
    }

    /// Valide puis enrichit un flux de séismes
    pub fn ingest(&self, events_text: &str) -> Result<(FeatureCollection, ClassifyStats), IngestError> {
        let mut events = ingest_events(self.registry(), events_text)?;
        let stats = classify(&mut events, &self.locator);
        info!(matched = stats.matched, unmatched = stats.unmatched, "séismes classés");
        Ok((events, stats))
    }

    /// "Any" puis les noms de région, pour la liste de choix
    pub fn selection_options(&self) -> Vec<String> {
        filter::selection_options(&self.regions, &self.config.region_property)
    }

    /// Le sous-ensemble visible pour une sélection, et son expression
    pub fn view(&self, events: &FeatureCollection, selection: &str) -> (FeatureCollection, Value) {
        let filter = Filter::from_selection(selection);
        (filter::select(events, &filter), filter.expression())
    }

    pub fn write(&self, events: &FeatureCollection) -> Result<String, IngestError> {
        write_events(self.registry(), events)
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryRule;
    use crate::core::catalog::{sample_event, sample_region};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn events_text(features: Vec<Value>) -> String {
        json!({"type": "FeatureCollection", "features": features}).to_string()
    }

    fn testland() -> String {
        json!({
            "type": "FeatureCollection",
            "features": [sample_region("Testland", [(0.0, 0.0), (10.0, 10.0)])],
        })
        .to_string()
    }

    #[test]
    fn test_testland_end_to_end() {
        let map = QuakeMap::load(&testland(), ClassifierConfig::default()).unwrap();
        let (events, stats) = map.ingest(&events_text(vec![sample_event("t1", 5.0, 5.0, 0)])).unwrap();
        assert_eq!(stats.matched, 1);

        let props = &events.features[0].properties;
        assert_eq!(props.get("region"), Some(&json!("Testland")));
        assert_eq!(props.get("year"), Some(&json!(1970)));
        assert_eq!(props.get("month"), Some(&json!(0)));
        assert_eq!(props.get("day"), Some(&json!(4)));
        assert_eq!(props.get("hide"), Some(&json!(false)));
        assert_eq!(props.get("mag_type"), Some(&json!("mb")));
    }

    #[test]
    fn test_corner_point_follows_boundary_rule() {
        let text = events_text(vec![sample_event("coin", 0.0, 0.0, 0)]);

        let inclusive = QuakeMap::load(&testland(), ClassifierConfig::default()).unwrap();
        let (events, _) = inclusive.ingest(&text).unwrap();
        assert_eq!(events.features[0].region(), Some("Testland"));

        let config = ClassifierConfig {
            boundary: BoundaryRule::Exclusive,
            ..ClassifierConfig::default()
        };
        let exclusive = QuakeMap::load(&testland(), config).unwrap();
        let (events, _) = exclusive.ingest(&text).unwrap();
        assert_eq!(events.features[0].region(), None);
    }

    #[test]
    fn test_missing_time_is_a_cast_error() {
        let mut event = sample_event("t1", 5.0, 5.0, 0);
        event["properties"].as_object_mut().unwrap().remove("time");
        let err = ingest_events(catalog::builtin(), &events_text(vec![event])).unwrap_err();
        let err = match err {
            IngestError::Cast(err) => err,
            other => panic!("erreur inattendue : {}", other),
        };
        assert_eq!(err.path, "features[0].properties.time");
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = ingest_events(catalog::builtin(), "{\"type\": ").unwrap_err();
        assert!(matches!(err, IngestError::Json(_)));
    }

    #[test]
    fn test_invalid_region_ring() {
        let regions = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"ADMIN": "Ouvert"},
                "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [0, 1], [1, 1], [1, 0]]]},
            }],
        });
        let err = QuakeMap::load(&regions.to_string(), ClassifierConfig::default()).unwrap_err();
        match err {
            IngestError::Geometry(GeometryError::InvalidRegion { index, name, source }) => {
                assert_eq!((index, name.as_str()), (0, "Ouvert"));
                assert_eq!(*source, GeometryError::RingNotClosed { ring: 0 });
            }
            other => panic!("erreur inattendue : {}", other),
        }
    }

    #[test]
    fn test_write_restores_wire_names() {
        let map = QuakeMap::load(&testland(), ClassifierConfig::default()).unwrap();
        let (events, _) = map.ingest(&events_text(vec![sample_event("t1", 5.0, 5.0, 0)])).unwrap();
        let text = map.write(&events).unwrap();
        assert!(text.starts_with("{\n  \""));

        let back: Value = serde_json::from_str(&text).unwrap();
        let props = &back["features"][0]["properties"];
        assert_eq!(props["magType"], json!("mb"));
        assert!(props.get("mag_type").is_none());
        assert_eq!(props["region"], json!("Testland"));

        // Une collection déjà enrichie se réingère et reste stable
        let (again, stats) = map.ingest(&text).unwrap();
        assert_eq!(again, events);
        assert_eq!(stats.already_classified, 1);
    }

    #[test]
    fn test_empty_id_survives_write_back() {
        let map = QuakeMap::load(&testland(), ClassifierConfig::default()).unwrap();
        let (events, _) = map.ingest(&events_text(vec![sample_event("", 5.0, 5.0, 0)])).unwrap();
        let text = map.write(&events).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back["features"][0]["id"], json!(""));
    }

    #[test]
    fn test_fractional_time_is_ingested() {
        let mut event = sample_event("t1", 5.0, 5.0, 0);
        event["properties"]["time"] = json!(1700000000000.5);
        let events = ingest_events(catalog::builtin(), &events_text(vec![event])).unwrap();
        assert_eq!(events.features[0].time_millis(), Some(1_700_000_000_000));
    }

    #[test]
    fn test_view_and_options() {
        let regions = json!({
            "type": "FeatureCollection",
            "features": [
                sample_region("Chile", [(0.0, 0.0), (10.0, 10.0)]),
                sample_region("Peru", [(20.0, 20.0), (30.0, 30.0)]),
            ],
        });
        let map = QuakeMap::load(&regions.to_string(), ClassifierConfig::default()).unwrap();
        assert_eq!(map.selection_options(), ["Any", "Chile", "Peru"]);

        let (events, _) = map
            .ingest(&events_text(vec![
                sample_event("a", 5.0, 5.0, 0),
                sample_event("b", 25.0, 25.0, 0),
                sample_event("c", 50.0, 50.0, 0),
            ]))
            .unwrap();

        let (chile, expr) = map.view(&events, "Chile");
        assert_eq!(chile.iter().map(|f| f.id()).collect::<Vec<_>>(), ["a"]);
        assert_eq!(expr, json!(["==", "region", "Chile"]));

        let (all, expr) = map.view(&events, "Any");
        assert_eq!(all.len(), 3);
        assert_eq!(expr, json!(["==", "hide", false]));
    }

    #[test]
    fn test_custom_region_property() {
        let regions = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"name_en": "Testland"},
                "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [0, 10], [10, 10], [10, 0], [0, 0]]]},
            }],
        });
        let config = ClassifierConfig {
            region_property: "name_en".into(),
            ..ClassifierConfig::default()
        };
        let map = QuakeMap::load(&regions.to_string(), config).unwrap();
        assert!(map.registry().contains(REGION_COLLECTION));
        let (events, _) = map.ingest(&events_text(vec![sample_event("t1", 5.0, 5.0, 0)])).unwrap();
        assert_eq!(events.features[0].region(), Some("Testland"));
    }
}
