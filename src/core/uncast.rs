// =============================================================================
// UNCAST — Retour d'une valeur typée vers un JSON sûr à réémettre
// =============================================================================
//
// uncast est le miroir de cast : même parcours du schéma, mêmes règles
// (ordre des unions, politique des champs inconnus), mais dans l'autre
// sens :
//   - les champs déclarés sont relus par leur nom CIBLE et réécrits sous
//     leur nom JSON
//   - une Date redevient EXACTEMENT la chaîne reçue à l'origine
//   - un champ absent (undefined) n'est pas émis
//
// PROPRIÉTÉ : pour tout j tel que cast(j, S) = v, uncast(v, S) est égal à j
// restreint aux champs déclarés par S (plus les champs recopiés en
// pass-through).
//
// =============================================================================

use serde_json::{Map, Value};

use super::cast::{CastError, Segment};
use super::registry::SchemaRegistry;
use super::schema::{Additional, SchemaNode};
use super::typeside::{is_integral, Primitive, TypedValue};

/// Reconvertit `value` en JSON selon le schéma `schema_name`.
///
/// Échoue (avec la même forme d'erreur que cast) si la valeur typée ne
/// correspond pas au schéma, par exemple si elle a été construite à la main.
pub fn uncast<'a>(
    registry: &'a SchemaRegistry,
    value: &'a TypedValue,
    schema_name: &'a str,
) -> Result<Value, CastError> {
    let Some(root) = registry.get(schema_name) else {
        return Err(CastError::unknown_schema(schema_name, value.to_string()));
    };
    let mut uncaster = Uncaster {
        registry,
        path: Vec::new(),
    };
    let json = uncaster.transform(Some(value), root, Some(schema_name), None)?;
    Ok(json.unwrap_or(Value::Null))
}

struct Uncaster<'a> {
    registry: &'a SchemaRegistry,
    path: Vec<Segment<'a>>,
}

impl<'a> Uncaster<'a> {
    fn fail(&self, expected: String, actual: Option<&TypedValue>, parent: Option<&str>) -> CastError {
        let actual = actual.map_or_else(|| "undefined".to_string(), TypedValue::to_string);
        CastError::at(&self.path, expected, actual, parent)
    }

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

    fn transform(
        &mut self,
        value: Option<&'a TypedValue>,
        node: &'a SchemaNode,
        named: Option<&'a str>,
        parent: Option<&'a str>,
    ) -> Result<Option<Value>, CastError> {
        let Some((node, via)) = self.registry.resolve(node) else {
            return Err(self.fail(node.describe(), value, parent));
        };
        let named = via.or(named);

        match node {
            SchemaNode::Primitive(p) => self.primitive(*p, value, parent),

            SchemaNode::Literal(expected) => match value.map(TypedValue::to_json) {
                Some(json) if json == *expected => Ok(Some(json)),
                _ => Err(self.fail(node.describe(), value, parent)),
            },

            SchemaNode::Enum(cases) => match value.map(TypedValue::to_json) {
                Some(json) if cases.contains(&json) => Ok(Some(json)),
                _ => Err(self.fail(node.describe(), value, parent)),
            },

            SchemaNode::Array(item_schema) => {
                let Some(TypedValue::Array(items)) = value else {
                    return Err(self.fail("array".to_string(), value, parent));
                };
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let json = self.descend(Segment::Index(i), |u| {
                        u.transform(Some(item), item_schema, None, parent)
                    })?;
                    out.push(json.unwrap_or(Value::Null));
                }
                Ok(Some(Value::Array(out)))
            }

            SchemaNode::Union(alternatives) => {
                for alt in alternatives {
                    if let Ok(json) = self.transform(value, alt, None, parent) {
                        return Ok(json);
                    }
                }
                Err(self.fail(node.describe(), value, parent))
            }

            SchemaNode::Object(object) => {
                let Some(TypedValue::Object(fields)) = value else {
                    let expected = named.unwrap_or("object").to_string();
                    return Err(self.fail(expected, value, parent));
                };

                let mut out = Map::new();
                for field in &object.fields {
                    let v = fields.get(&field.target);
                    let json = self.descend(Segment::Key(field.target.as_str()), |u| {
                        u.transform(v, &field.schema, None, named)
                    })?;
                    if let Some(json) = json {
                        out.insert(field.wire.clone(), json);
                    }
                }

                for (key, v) in fields {
                    if object.by_target(key).is_some() {
                        continue;
                    }
                    let json = match &object.additional {
                        Additional::Reject => {
                            return self.descend(Segment::Key(key.as_str()), |u| {
                                Err(u.fail("aucun champ supplémentaire".to_string(), Some(v), named))
                            });
                        }
                        Additional::PassThrough => Some(v.to_json()),
                        Additional::Typed(values) => self.descend(Segment::Key(key.as_str()), |u| {
                            u.transform(Some(v), values, None, named)
                        })?,
                    };
                    if let Some(json) = json {
                        out.entry(key.clone()).or_insert(json);
                    }
                }
                Ok(Some(Value::Object(out)))
            }

            SchemaNode::Reference(name) => Err(self.fail(name.clone(), value, parent)),
        }
    }

    fn primitive(
        &self,
        p: Primitive,
        value: Option<&'a TypedValue>,
        parent: Option<&str>,
    ) -> Result<Option<Value>, CastError> {
        let json = match (p, value) {
            (Primitive::Undefined, None) | (Primitive::Any, None) => return Ok(None),
            (Primitive::Any, Some(v)) => v.to_json(),
            (Primitive::String, Some(TypedValue::String(s))) => Value::String(s.clone()),
            (Primitive::Number, Some(TypedValue::Number(n))) => Value::Number(n.clone()),
            (Primitive::Integer, Some(TypedValue::Number(n))) if is_integral(n) => Value::Number(n.clone()),
            (Primitive::Boolean, Some(TypedValue::Bool(b))) => Value::Bool(*b),
            // Fidélité de l'aller-retour : la forme brute, pas un reformatage
            (Primitive::Date, Some(TypedValue::Date(d))) => Value::String(d.raw().to_string()),
            _ => return Err(self.fail(p.name().to_string(), value, parent)),
        };
        Ok(Some(json))
    }
}
