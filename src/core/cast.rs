// =============================================================================
// CAST — Valider et convertir un JSON brut contre un schéma nommé
// =============================================================================
//
// cast(registre, json, "Event") parcourt le JSON et le schéma EN MÊME TEMPS :
//
//   Primitive → le type JSON doit être exactement le bon (pas de coercition)
//   Literal   → égalité stricte
//   Enum      → appartenance ; l'erreur liste toutes les valeurs admises
//   Array     → chaque élément est casté, l'ordre est préservé
//   Union     → alternatives essayées DANS L'ORDRE DÉCLARÉ, la première
//               qui réussit gagne (ce n'est PAS la plus spécifique)
//   Object    → chaque champ déclaré est casté par son nom JSON et rangé
//               sous son nom cible ; un champ absent est casté comme
//               "undefined" ; les champs inconnus suivent la politique
//   Reference → on suit le nom dans le registre
//
// FAIL-FAST : la première violation arrête tout. Pas de résultat partiel.
// L'erreur donne le chemin exact depuis la racine ("features[3].properties.time"),
// le type attendu (pretty-printer du schéma) et la valeur reçue.
//
// =============================================================================

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde_json::Value;
use thiserror::Error;

use super::registry::SchemaRegistry;
use super::schema::{Additional, SchemaNode};
use super::typeside::{is_integral, DateValue, Primitive, TypedValue};

/// Longueur max du rendu de la valeur reçue dans un message
const MAX_ACTUAL_LEN: usize = 120;

/// Un pas dans le chemin depuis la racine du schéma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Rend un chemin en notation points/crochets : `features[0].properties.time`
pub(crate) fn render_path(segments: &[Segment<'_>]) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            Segment::Index(i) => {
                let _ = write!(out, "[{}]", i);
            }
        }
    }
    out
}

/// Rendu compact (et tronqué) d'une valeur pour les diagnostics
pub(crate) fn compact(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return "undefined".to_string();
    };
    let rendered = value.to_string();
    if rendered.chars().count() <= MAX_ACTUAL_LEN {
        rendered
    } else {
        let mut cut: String = rendered.chars().take(MAX_ACTUAL_LEN).collect();
        cut.push('…');
        cut
    }
}

/// Erreur de cast (ou d'uncast) : la valeur ne correspond pas au schéma.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("valeur invalide{} : attendu {} mais reçu {}", self.location(), .expected, .actual)]
pub struct CastError {
    /// Chemin depuis la racine ; vide pour la racine elle-même
    pub path: String,
    /// Dernier nom de champ du chemin
    pub key: Option<String>,
    /// Nom du schéma objet qui contient la valeur fautive
    pub parent: Option<String>,
    /// Description du type attendu
    pub expected: String,
    /// Valeur reçue, rendue en JSON compact ("undefined" si absente)
    pub actual: String,
}

impl CastError {
    pub(crate) fn at(
        segments: &[Segment<'_>],
        expected: String,
        actual: String,
        parent: Option<&str>,
    ) -> Self {
        let key = segments.iter().rev().find_map(|s| match s {
            Segment::Key(k) => Some(k.to_string()),
            Segment::Index(_) => None,
        });
        CastError {
            path: render_path(segments),
            key,
            parent: parent.map(str::to_string),
            expected,
            actual,
        }
    }

    /// ` pour la clé "k" sur Parent (chemin p)`, chaque partie si connue
    fn location(&self) -> String {
        let mut out = String::new();
        if let Some(key) = &self.key {
            let _ = write!(out, " pour la clé \"{}\"", key);
        }
        if let Some(parent) = &self.parent {
            let _ = write!(out, " sur {}", parent);
        }
        if !self.path.is_empty() {
            let _ = write!(out, " (chemin {})", self.path);
        }
        out
    }

    /// Le nom demandé n'est pas dans le registre
    pub(crate) fn unknown_schema(name: &str, actual: String) -> Self {
        CastError {
            path: String::new(),
            key: None,
            parent: None,
            expected: format!("un schéma enregistré nommé \"{}\"", name),
            actual,
        }
    }
}

/// Caste `raw` contre le schéma `schema_name` du registre.
pub fn cast<'a>(
    registry: &'a SchemaRegistry,
    raw: &'a Value,
    schema_name: &'a str,
) -> Result<TypedValue, CastError> {
    let Some(root) = registry.get(schema_name) else {
        return Err(CastError::unknown_schema(schema_name, compact(Some(raw))));
    };
    let mut caster = Caster {
        registry,
        path: Vec::new(),
    };
    // Une valeur présente ne produit jamais "undefined"
    let typed = caster.transform(Some(raw), root, Some(schema_name), None)?;
    Ok(typed.unwrap_or(TypedValue::Null))
}

struct Caster<'a> {
    registry: &'a SchemaRegistry,
    path: Vec<Segment<'a>>,
}

impl<'a> Caster<'a> {
    fn fail(&self, expected: String, actual: Option<&Value>, parent: Option<&str>) -> CastError {
        CastError::at(&self.path, expected, compact(actual), parent)
    }

    /// Exécute `f` un cran plus bas dans le chemin ; le chemin est restauré
    /// même en cas d'échec (les unions réessaient au même endroit).
    fn descend<T>(
        &mut self,
        seg: Segment<'a>,
        f: impl FnOnce(&mut Self) -> Result<T, CastError>,
    ) -> Result<T, CastError> {
        self.path.push(seg);
        let out = f(self);
        self.path.pop();
        out
    }

    /// `Ok(None)` signifie "undefined" : le champ reste absent.
    ///
    /// `named` est le nom du schéma si `node` vient du registre ; `parent`
    /// est le nom de l'objet englobant.
    fn transform(
        &mut self,
        value: Option<&'a Value>,
        node: &'a SchemaNode,
        named: Option<&'a str>,
        parent: Option<&'a str>,
    ) -> Result<Option<TypedValue>, CastError> {
        let Some((node, via)) = self.registry.resolve(node) else {
            return Err(self.fail(node.describe(), value, parent));
        };
        let named = via.or(named);

        match node {
            SchemaNode::Primitive(p) => self.primitive(*p, value, parent),

            SchemaNode::Literal(expected) => match value {
                Some(v) if v == expected => Ok(Some(TypedValue::from(v.clone()))),
                _ => Err(self.fail(node.describe(), value, parent)),
            },

            SchemaNode::Enum(cases) => match value {
                Some(v) if cases.contains(v) => Ok(Some(TypedValue::from(v.clone()))),
                _ => Err(self.fail(node.describe(), value, parent)),
            },

            SchemaNode::Array(item_schema) => {
                let Some(Value::Array(items)) = value else {
                    return Err(self.fail("array".to_string(), value, parent));
                };
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let typed = self.descend(Segment::Index(i), |c| {
                        c.transform(Some(item), item_schema, None, parent)
                    })?;
                    out.push(typed.unwrap_or(TypedValue::Null));
                }
                Ok(Some(TypedValue::Array(out)))
            }

            SchemaNode::Union(alternatives) => {
                for alt in alternatives {
                    if let Ok(typed) = self.transform(value, alt, None, parent) {
                        return Ok(typed);
                    }
                }
                Err(self.fail(node.describe(), value, parent))
            }

            SchemaNode::Object(object) => {
                let Some(Value::Object(input)) = value else {
                    let expected = named.unwrap_or("object").to_string();
                    return Err(self.fail(expected, value, parent));
                };

                let mut out = BTreeMap::new();
                for field in &object.fields {
                    let v = input.get(&field.wire);
                    let typed = self.descend(Segment::Key(field.wire.as_str()), |c| {
                        c.transform(v, &field.schema, None, named)
                    })?;
                    if let Some(typed) = typed {
                        out.insert(field.target.clone(), typed);
                    }
                }

                for (key, v) in input {
                    if object.by_wire(key).is_some() {
                        continue;
                    }
                    let typed = match &object.additional {
                        Additional::Reject => {
                            return self.descend(Segment::Key(key.as_str()), |c| {
                                Err(c.fail("aucun champ supplémentaire".to_string(), Some(v), named))
                            });
                        }
                        Additional::PassThrough => Some(TypedValue::Untyped(v.clone())),
                        Additional::Typed(values) => self.descend(Segment::Key(key.as_str()), |c| {
                            c.transform(Some(v), values, None, named)
                        })?,
                    };
                    if let Some(typed) = typed {
                        // Un champ déclaré garde la priorité sur un inconnu homonyme
                        out.entry(key.clone()).or_insert(typed);
                    }
                }
                Ok(Some(TypedValue::Object(out)))
            }

            // resolve() ne s'arrête jamais sur une Reference
            SchemaNode::Reference(name) => Err(self.fail(name.clone(), value, parent)),
        }
    }

    fn primitive(
        &self,
        p: Primitive,
        value: Option<&'a Value>,
        parent: Option<&str>,
    ) -> Result<Option<TypedValue>, CastError> {
        let typed = match (p, value) {
            (Primitive::Undefined, None) | (Primitive::Any, None) => return Ok(None),
            (Primitive::Any, Some(v)) => TypedValue::Untyped(v.clone()),
            (Primitive::String, Some(Value::String(s))) => TypedValue::String(s.clone()),
            (Primitive::Number, Some(Value::Number(n))) => TypedValue::Number(n.clone()),
            (Primitive::Integer, Some(Value::Number(n))) if is_integral(n) => TypedValue::Number(n.clone()),
            (Primitive::Boolean, Some(Value::Bool(b))) => TypedValue::Bool(*b),
            // Un nombre n'est jamais interprété comme une date
            (Primitive::Date, Some(Value::String(s))) => match DateValue::parse(s) {
                Some(d) => TypedValue::Date(d),
                None => return Err(self.fail(p.name().to_string(), value, parent)),
            },
            _ => return Err(self.fail(p.name().to_string(), value, parent)),
        };
        Ok(Some(typed))
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ObjectSchema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut b = SchemaRegistry::builder();
        b.define("Alert", SchemaNode::enumeration(["green", "yellow"]))
            .define(
                "Geometry",
                ObjectSchema::strict()
                    .field("type", SchemaNode::literal("Point"))
                    .field("coordinates", SchemaNode::array(SchemaNode::number())),
            )
            .define(
                "Props",
                ObjectSchema::strict()
                    .field("mag", SchemaNode::nullable(SchemaNode::number()))
                    .field("time", SchemaNode::integer())
                    .field("alert", SchemaNode::nullable(SchemaNode::reference("Alert")))
                    .renamed("magType", "mag_type", SchemaNode::optional(SchemaNode::string())),
            )
            .define(
                "Feature",
                ObjectSchema::strict()
                    .field("id", SchemaNode::string())
                    .field("geometry", SchemaNode::reference("Geometry"))
                    .field("properties", SchemaNode::reference("Props")),
            )
            .define("Open", ObjectSchema::open().field("name", SchemaNode::string()))
            .define("Counts", SchemaNode::map(SchemaNode::integer()))
            .define("Stamp", ObjectSchema::strict().field("at", SchemaNode::date()))
            .define(
                "NumOrString",
                SchemaNode::union(vec![SchemaNode::number(), SchemaNode::any()]),
            );
        b.build().unwrap()
    }

    fn feature(props: Value) -> Value {
        json!({
            "id": "ci123",
            "geometry": {"type": "Point", "coordinates": [-117.5, 35.2, 8.1]},
            "properties": props,
        })
    }

    #[test]
    fn test_cast_feature_renames_fields() {
        let reg = registry();
        let raw = feature(json!({"mag": 2.5, "time": 0, "alert": null, "magType": "ml"}));
        let typed = cast(&reg, &raw, "Feature").unwrap();

        let props = typed.get("properties").unwrap();
        assert_eq!(props.get("mag_type"), Some(&TypedValue::String("ml".into())));
        assert!(props.get("magType").is_none());
        assert_eq!(props.get("alert"), Some(&TypedValue::Null));
    }

    #[test]
    fn test_primitive_no_coercion() {
        let reg = registry();
        let raw = feature(json!({"mag": "2.5", "time": 0, "alert": null}));
        let err = cast(&reg, &raw, "Feature").unwrap_err();
        assert_eq!(err.path, "properties.mag");
        assert_eq!(err.expected, "one of [number, null]");
        assert_eq!(err.actual, "\"2.5\"");
        assert_eq!(err.parent.as_deref(), Some("Props"));
    }

    #[test]
    fn test_missing_required_field_reports_path() {
        let reg = registry();
        let raw = feature(json!({"mag": 1.0, "alert": null}));
        let err = cast(&reg, &raw, "Feature").unwrap_err();
        assert_eq!(err.path, "properties.time");
        assert_eq!(err.key.as_deref(), Some("time"));
        assert_eq!(err.actual, "undefined");
        assert_eq!(
            err.to_string(),
            "valeur invalide pour la clé \"time\" sur Props (chemin properties.time) : attendu integer mais reçu undefined"
        );
    }

    #[test]
    fn test_cast_error_is_a_std_error() {
        let err = cast(&registry(), &json!("purple"), "Alert").unwrap_err();
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert_eq!(
            boxed.to_string(),
            r#"valeur invalide : attendu one of ["green", "yellow"] mais reçu "purple""#
        );
    }

    #[test]
    fn test_absent_optional_field_stays_absent() {
        let reg = registry();
        let raw = feature(json!({"mag": null, "time": 5, "alert": "green"}));
        let typed = cast(&reg, &raw, "Feature").unwrap();
        assert!(typed.get("properties").unwrap().get("mag_type").is_none());
    }

    #[test]
    fn test_absent_nullable_field_is_rejected() {
        // null et absent sont deux choses différentes
        let reg = registry();
        let raw = feature(json!({"time": 5, "alert": null}));
        let err = cast(&reg, &raw, "Feature").unwrap_err();
        assert_eq!(err.path, "properties.mag");
    }

    #[test]
    fn test_enum_error_lists_alternatives() {
        let reg = registry();
        let err = cast(&reg, &json!("purple"), "Alert").unwrap_err();
        assert_eq!(err.expected, r#"one of ["green", "yellow"]"#);
        assert!(err.to_string().contains(r#"["green", "yellow"]"#));
    }

    #[test]
    fn test_unknown_field_rejected_on_strict_object() {
        let reg = registry();
        let mut raw = feature(json!({"mag": 1.0, "time": 1, "alert": null}));
        raw["geometry"]["bbox"] = json!([0, 0]);
        let err = cast(&reg, &raw, "Feature").unwrap_err();
        assert_eq!(err.path, "geometry.bbox");
        assert_eq!(err.parent.as_deref(), Some("Geometry"));
    }

    #[test]
    fn test_unknown_field_passes_through_on_open_object() {
        let reg = registry();
        let typed = cast(&reg, &json!({"name": "Chile", "ISO_A3": "CHL"}), "Open").unwrap();
        assert_eq!(typed.get("ISO_A3"), Some(&TypedValue::Untyped(json!("CHL"))));
    }

    #[test]
    fn test_map_casts_every_value() {
        let reg = registry();
        assert!(cast(&reg, &json!({"a": 1, "b": 2}), "Counts").is_ok());
        let err = cast(&reg, &json!({"a": 1, "b": 2.5}), "Counts").unwrap_err();
        assert_eq!(err.path, "b");
        assert_eq!(err.expected, "integer");
    }

    #[test]
    fn test_array_reports_first_failing_index() {
        let reg = registry();
        let mut raw = feature(json!({"mag": 1.0, "time": 1, "alert": null}));
        raw["geometry"]["coordinates"] = json!([1.0, "x", "y"]);
        let err = cast(&reg, &raw, "Feature").unwrap_err();
        assert_eq!(err.path, "geometry.coordinates[1]");
    }

    #[test]
    fn test_object_type_error_names_reference() {
        let reg = registry();
        let raw = json!({"id": "x", "geometry": [1, 2], "properties": {}});
        let err = cast(&reg, &raw, "Feature").unwrap_err();
        assert_eq!(err.path, "geometry");
        assert_eq!(err.expected, "Geometry");
    }

    #[test]
    fn test_union_first_declared_alternative_wins() {
        let reg = registry();
        // 3 satisfait number ET any : number est déclaré en premier
        let typed = cast(&reg, &json!(3), "NumOrString").unwrap();
        assert_eq!(typed, TypedValue::Number(3.into()));

        let mut b = SchemaRegistry::builder();
        b.define("AnyOrNum", SchemaNode::union(vec![SchemaNode::any(), SchemaNode::number()]));
        let swapped = b.build().unwrap();
        let typed = cast(&swapped, &json!(3), "AnyOrNum").unwrap();
        assert_eq!(typed, TypedValue::Untyped(json!(3)));
    }

    #[test]
    fn test_dates_parse_strings_only() {
        let reg = registry();
        let typed = cast(&reg, &json!({"at": "2020-02-29T00:00:00Z"}), "Stamp").unwrap();
        assert!(matches!(typed.get("at"), Some(TypedValue::Date(_))));

        let err = cast(&reg, &json!({"at": 1582934400000i64}), "Stamp").unwrap_err();
        assert_eq!(err.expected, "Date");
        assert!(cast(&reg, &json!({"at": "hier"}), "Stamp").is_err());
    }

    #[test]
    fn test_unknown_schema_name() {
        let reg = registry();
        let err = cast(&reg, &json!({}), "Nope").unwrap_err();
        assert!(err.expected.contains("Nope"));
    }

    #[test]
    fn test_actual_value_is_truncated() {
        let long = Value::String("x".repeat(500));
        let rendered = compact(Some(&long));
        assert_eq!(rendered.chars().count(), MAX_ACTUAL_LEN + 1);
        assert!(rendered.ends_with('…'));
    }
}
