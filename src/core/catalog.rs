// =============================================================================
// CATALOG — Les schémas intégrés : flux sismique et polygones de pays
// =============================================================================
//
// Deux familles de schémas :
//
//   EventCollection  → le flux GeoJSON de séismes (points)
//     └─ Event
//          ├─ EventGeometry   { type: "Point", coordinates: [lon, lat, prof.] }
//          └─ EventProperties { mag, place, time, ..., magType → mag_type }
//
//   RegionCollection → les polygones de pays (admin name dans "ADMIN")
//     └─ Region
//          ├─ PolygonGeometry | MultiPolygonGeometry
//          └─ RegionProperties { ADMIN: string, ... recopiés tels quels }
//
// Les propriétés d'événement sont STRICTES : un statut, un réseau ou un
// type d'événement hors de l'énumération est rejeté, jamais corrigé. Les
// champs dérivés (region, hide, year, month, day) sont déclarés
// optionnels : une collection enrichie repasse par uncast sans erreur.
//
// =============================================================================

use std::sync::LazyLock;

use super::registry::SchemaRegistry;
use super::schema::{ObjectSchema, SchemaNode};
use super::validate::SchemaResolutionError;

pub const EVENT_COLLECTION: &str = "EventCollection";
pub const EVENT: &str = "Event";
pub const EVENT_GEOMETRY: &str = "EventGeometry";
pub const EVENT_PROPERTIES: &str = "EventProperties";
pub const METADATA: &str = "Metadata";

pub const REGION_COLLECTION: &str = "RegionCollection";
pub const REGION: &str = "Region";
pub const POLYGON_GEOMETRY: &str = "PolygonGeometry";
pub const MULTI_POLYGON_GEOMETRY: &str = "MultiPolygonGeometry";
pub const REGION_PROPERTIES: &str = "RegionProperties";

/// Propriété des pays qui porte le nom administratif
pub const DEFAULT_REGION_PROPERTY: &str = "ADMIN";

const ALERTS: &[&str] = &["green", "yellow"];

const MAG_TYPES: &[&str] = &["mb", "mb_lg", "md", "mh", "ml", "mw", "mwr", "mww"];

const NETS: &[&str] = &[
    "av", "ak", "ci", "hv", "mb", "nc", "nm", "nn", "ok", "pr", "se", "tx", "us", "uu", "uw",
];

const SOURCES: &[&str] = &[
    ",av,", ",av,ak,", ",ak,", ",ak,av,", ",ak,at,us,", ",ak,us,", ",ci,", ",ci,us,",
    ",ew,nc,us,", ",hv,", ",hv,us,", ",mb,", ",mb,us,", ",nc,", ",nc,nn,", ",nc,nn,us,",
    ",nc,us,", ",nc,us,nn,", ",nm,", ",nn,", ",nn,us,", ",ok,", ",ok,us,", ",pr,", ",se,",
    ",se,us,", ",tx,", ",us,", ",us,ak,", ",us,at,ak,", ",us,hv,", ",us,mb,", ",us,nn,",
    ",us,ok,", ",us,pr,", ",us,se,", ",us,tx,", ",uu,", ",uw,",
];

const STATUSES: &[&str] = &["automatic", "reviewed"];

const EVENT_TYPES: &[&str] = &["earthquake", "explosion", "quarry blast"];

/// Registre intégré, construit une seule fois pour tout le processus.
///
/// Le catalogue est figé dans le code : s'il ne se résout pas, c'est un
/// bug de construction, couvert par les tests de ce module.
pub static BUILTIN: LazyLock<SchemaRegistry> = LazyLock::new(|| {
    build(DEFAULT_REGION_PROPERTY).unwrap_or_else(|errors| {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        panic!("catalogue de schémas intégré invalide : {}", details.join("; "))
    })
});

/// Le registre intégré (voir [`BUILTIN`])
pub fn builtin() -> &'static SchemaRegistry {
    &BUILTIN
}

/// Construit le catalogue ; `region_property` est la propriété texte
/// obligatoire des polygones de région.
pub fn build(region_property: &str) -> Result<SchemaRegistry, Vec<SchemaResolutionError>> {
    let mut b = SchemaRegistry::builder();

    // --- Énumérations -------------------------------------------------------
    b.define("Alert", SchemaNode::enumeration(ALERTS.iter().copied()))
        .define("MagType", SchemaNode::enumeration(MAG_TYPES.iter().copied()))
        .define("Net", SchemaNode::enumeration(NETS.iter().copied()))
        .define("Sources", SchemaNode::enumeration(SOURCES.iter().copied()))
        .define("Status", SchemaNode::enumeration(STATUSES.iter().copied()))
        .define("EventType", SchemaNode::enumeration(EVENT_TYPES.iter().copied()))
        .define("FeatureType", SchemaNode::enumeration(["Feature"]))
        .define("GeometryType", SchemaNode::enumeration(["Point"]));

    // --- Flux sismique ------------------------------------------------------
    b.define(
        EVENT_COLLECTION,
        ObjectSchema::strict()
            .field("type", SchemaNode::literal("FeatureCollection"))
            .field("metadata", SchemaNode::optional(SchemaNode::reference(METADATA)))
            .field("features", SchemaNode::array(SchemaNode::reference(EVENT)))
            .field("bbox", SchemaNode::optional(SchemaNode::array(SchemaNode::number()))),
    )
    .define(
        METADATA,
        ObjectSchema::strict()
            .field("generated", SchemaNode::number())
            .field("url", SchemaNode::string())
            .field("title", SchemaNode::string())
            .field("status", SchemaNode::number())
            .field("api", SchemaNode::string())
            .field("count", SchemaNode::number()),
    )
    .define(
        EVENT,
        ObjectSchema::strict()
            .field("type", SchemaNode::reference("FeatureType"))
            .field("properties", SchemaNode::reference(EVENT_PROPERTIES))
            .field("geometry", SchemaNode::reference(EVENT_GEOMETRY))
            .field("id", SchemaNode::string()),
    )
    .define(
        EVENT_GEOMETRY,
        ObjectSchema::strict()
            .field("type", SchemaNode::reference("GeometryType"))
            .field("coordinates", SchemaNode::array(SchemaNode::number())),
    )
    .define(EVENT_PROPERTIES, event_properties());

    // --- Polygones de région ------------------------------------------------
    b.define(
        REGION_COLLECTION,
        ObjectSchema::open()
            .field("type", SchemaNode::literal("FeatureCollection"))
            .field("features", SchemaNode::array(SchemaNode::reference(REGION))),
    )
    .define(
        REGION,
        ObjectSchema::open()
            .field("type", SchemaNode::reference("FeatureType"))
            .field("id", SchemaNode::optional(SchemaNode::string()))
            .field("properties", SchemaNode::reference(REGION_PROPERTIES))
            .field(
                "geometry",
                SchemaNode::union(vec![
                    SchemaNode::reference(POLYGON_GEOMETRY),
                    SchemaNode::reference(MULTI_POLYGON_GEOMETRY),
                ]),
            ),
    )
    .define(
        POLYGON_GEOMETRY,
        ObjectSchema::strict()
            .field("type", SchemaNode::literal("Polygon"))
            .field("coordinates", nested_positions(2)),
    )
    .define(
        MULTI_POLYGON_GEOMETRY,
        ObjectSchema::strict()
            .field("type", SchemaNode::literal("MultiPolygon"))
            .field("coordinates", nested_positions(3)),
    )
    .define(
        REGION_PROPERTIES,
        ObjectSchema::open().field(region_property, SchemaNode::string()),
    );

    b.build()
}

fn event_properties() -> ObjectSchema {
    let nullable_number = || SchemaNode::nullable(SchemaNode::number());

    ObjectSchema::strict()
        .field("mag", nullable_number())
        .field("place", SchemaNode::string())
        .field("time", SchemaNode::number())
        .field("updated", SchemaNode::number())
        .field("tz", nullable_number())
        .field("url", SchemaNode::string())
        .field("detail", SchemaNode::string())
        .field("felt", nullable_number())
        .field("cdi", nullable_number())
        .field("mmi", nullable_number())
        .field("alert", SchemaNode::nullable(SchemaNode::reference("Alert")))
        .field("status", SchemaNode::reference("Status"))
        .field("tsunami", SchemaNode::number())
        .field("sig", SchemaNode::number())
        .field("net", SchemaNode::reference("Net"))
        .field("code", SchemaNode::string())
        .field("ids", SchemaNode::string())
        .field("sources", SchemaNode::reference("Sources"))
        .field("types", SchemaNode::string())
        .field("nst", nullable_number())
        .field("dmin", nullable_number())
        .field("rms", SchemaNode::number())
        .field("gap", nullable_number())
        .renamed("magType", "mag_type", SchemaNode::nullable(SchemaNode::reference("MagType")))
        .field("type", SchemaNode::reference("EventType"))
        .field("title", SchemaNode::string())
        // Champs dérivés par l'enrichissement
        .field("region", SchemaNode::optional(SchemaNode::string()))
        .field("hide", SchemaNode::optional(SchemaNode::boolean()))
        .field("year", SchemaNode::optional(SchemaNode::integer()))
        .field("month", SchemaNode::optional(SchemaNode::integer()))
        .field("day", SchemaNode::optional(SchemaNode::integer()))
}

/// Tableau de positions imbriqué `depth` fois (2 = anneaux d'un polygone)
fn nested_positions(depth: usize) -> SchemaNode {
    let position = SchemaNode::array(SchemaNode::number());
    (0..depth).fold(position, |inner, _| SchemaNode::array(inner))
}

/// Un événement complet et valide, pour les tests des autres modules.
#[cfg(test)]
pub(crate) fn sample_event(id: &str, lon: f64, lat: f64, time: i64) -> serde_json::Value {
    serde_json::json!({
        "type": "Feature",
        "id": id,
        "geometry": {"type": "Point", "coordinates": [lon, lat, 10.0]},
        "properties": {
            "mag": 4.2, "place": "somewhere", "time": time, "updated": time,
            "tz": null, "url": "https://example.org/e", "detail": "https://example.org/d",
            "felt": null, "cdi": null, "mmi": null, "alert": null, "status": "reviewed",
            "tsunami": 0, "sig": 271, "net": "us", "code": id, "ids": ",us,",
            "sources": ",us,", "types": ",origin,", "nst": null, "dmin": 1.5,
            "rms": 0.7, "gap": 40.0, "magType": "mb", "type": "earthquake",
            "title": "M 4.2 - somewhere",
        },
    })
}

/// Un carré nommé, pour les tests des autres modules.
#[cfg(test)]
pub(crate) fn sample_region(name: &str, corners: [(f64, f64); 2]) -> serde_json::Value {
    let [(x0, y0), (x1, y1)] = corners;
    serde_json::json!({
        "type": "Feature",
        "properties": {"ADMIN": name},
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[x0, y0], [x0, y1], [x1, y1], [x1, y0], [x0, y0]]],
        },
    })
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cast::cast;
    use crate::core::typeside::TypedValue;
    use crate::core::uncast::uncast;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_builtin_catalog_resolves() {
        let reg = builtin();
        assert!(reg.contains(EVENT_COLLECTION));
        assert!(reg.contains(REGION_COLLECTION));
        assert!(reg.contains("Sources"));
    }

    #[test]
    fn test_event_collection_round_trip() {
        let raw = json!({
            "type": "FeatureCollection",
            "metadata": {
                "generated": 1700000000000i64, "url": "u", "title": "t",
                "status": 200, "api": "1.10.3", "count": 2,
            },
            "features": [sample_event("us1", 10.0, 20.0, 0), sample_event("us2", -70.0, -30.0, 1)],
            "bbox": [-70.0, -30.0, 10.0, 10.0, 20.0, 10.0],
        });
        let typed = cast(builtin(), &raw, EVENT_COLLECTION).unwrap();
        let Some(TypedValue::Array(features)) = typed.get("features") else {
            panic!("features manquantes : {}", typed);
        };
        assert_eq!(
            features[0].get("properties").and_then(|p| p.get("mag_type")),
            Some(&TypedValue::String("mb".into()))
        );
        assert_eq!(uncast(builtin(), &typed, EVENT_COLLECTION).unwrap(), raw);
    }

    #[test]
    fn test_missing_time_points_at_property() {
        let mut event = sample_event("us1", 0.0, 0.0, 0);
        event["properties"].as_object_mut().unwrap().remove("time");
        let err = cast(builtin(), &event, EVENT).unwrap_err();
        assert_eq!(err.path, "properties.time");
        assert_eq!(err.parent.as_deref(), Some(EVENT_PROPERTIES));
    }

    #[test]
    fn test_out_of_set_status_rejected() {
        let mut event = sample_event("us1", 0.0, 0.0, 0);
        event["properties"]["status"] = json!("deleted");
        let err = cast(builtin(), &event, EVENT).unwrap_err();
        assert_eq!(err.path, "properties.status");
        assert_eq!(err.expected, r#"one of ["automatic", "reviewed"]"#);
    }

    #[test]
    fn test_fractional_time_is_a_number() {
        let mut event = sample_event("us1", 0.0, 0.0, 0);
        event["properties"]["time"] = json!(1700000000000.5);
        event["properties"]["tz"] = json!(-480);
        event["properties"]["sig"] = json!(12.5);
        let typed = cast(builtin(), &event, EVENT).unwrap();
        assert_eq!(
            typed.get("properties").and_then(|p| p.get("time")).map(TypedValue::to_json),
            Some(json!(1700000000000.5))
        );
    }

    #[test]
    fn test_enriched_event_is_still_valid() {
        let mut event = sample_event("us1", 0.0, 0.0, 0);
        let props = event["properties"].as_object_mut().unwrap();
        props.insert("region".into(), json!("Testland"));
        props.insert("hide".into(), json!(false));
        props.insert("year".into(), json!(1970));
        assert!(cast(builtin(), &event, EVENT).is_ok());
    }

    #[test]
    fn test_region_accepts_polygon_and_multipolygon() {
        let square = sample_region("Testland", [(0.0, 0.0), (10.0, 10.0)]);
        assert!(cast(builtin(), &square, REGION).is_ok());

        let multi = json!({
            "type": "Feature",
            "properties": {"ADMIN": "Archipel", "ISO_A3": "ARC"},
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [[[[0, 0], [0, 1], [1, 1], [0, 0]]], [[[5, 5], [5, 6], [6, 6], [5, 5]]]],
            },
        });
        assert!(cast(builtin(), &multi, REGION).is_ok());
    }

    #[test]
    fn test_region_without_admin_name_rejected() {
        let mut square = sample_region("Testland", [(0.0, 0.0), (10.0, 10.0)]);
        square["properties"] = json!({"NAME": "Testland"});
        let err = cast(builtin(), &square, REGION).unwrap_err();
        assert_eq!(err.path, "properties.ADMIN");
    }

    #[test]
    fn test_custom_region_property() {
        let reg = build("name_en").unwrap();
        let mut square = sample_region("Testland", [(0.0, 0.0), (1.0, 1.0)]);
        square["properties"] = json!({"name_en": "Testland"});
        assert!(cast(&reg, &square, REGION).is_ok());
    }
}
