// =============================================================================
// TYPESIDE — Les types primitifs et les valeurs typées
// =============================================================================
//
// Le Typeside définit les "briques élémentaires" du moteur de cast :
// les primitives (string, number, integer, boolean, Date, any, undefined)
// et la représentation d'une valeur APRÈS validation (TypedValue).
//
// ANALOGIE : le JSON brut est un sac de valeurs sans garantie ; une
// TypedValue est ce même sac après passage au contrôle, avec les noms de
// champs cibles et les dates reconnues comme telles.
//
// Une TypedValue garde assez d'information pour revenir au JSON d'origine
// (voir uncast) : une date conserve sa forme brute, un nombre garde son
// serde_json::Number exact.
//
// =============================================================================

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

/// Un type primitif du moteur de cast.
///
/// Le cast exige que le type JSON à l'exécution corresponde EXACTEMENT :
/// aucune coercition ("12" n'est jamais un nombre).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Chaîne JSON
    String,
    /// Nombre JSON quelconque
    Number,
    /// Nombre JSON de valeur entière (1 et 1.0 sont acceptés, 1.5 non)
    Integer,
    /// Booléen JSON
    Boolean,
    /// Chaîne RFC 3339 / ISO-8601 interprétée comme un instant
    Date,
    /// N'importe quoi, recopié sans typage
    Any,
    /// Ne correspond qu'à un champ ABSENT
    Undefined,
}

impl Primitive {
    /// Nom affiché dans les diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Integer => "integer",
            Primitive::Boolean => "boolean",
            Primitive::Date => "Date",
            Primitive::Any => "any",
            Primitive::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Vrai si le nombre JSON a une valeur entière.
pub fn is_integral(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// Une date castée : l'instant UTC + la chaîne exacte reçue.
///
/// La chaîne brute est ce que `uncast` réémet, pour que l'aller-retour
/// soit fidèle au caractère près.
#[derive(Debug, Clone, PartialEq)]
pub struct DateValue {
    instant: DateTime<Utc>,
    raw: String,
}

impl DateValue {
    /// Interprète une chaîne RFC 3339 ("2024-01-31T10:00:00Z") ou une date
    /// calendaire seule ("2024-01-31", minuit UTC).
    pub fn parse(raw: &str) -> Option<Self> {
        let instant = DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            })?;
        Some(DateValue {
            instant,
            raw: raw.to_string(),
        })
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// La forme exacte reçue sur le fil
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Une valeur validée contre un schéma.
///
/// Les objets sont indexés par leurs noms CIBLES (après renommage).
/// `Untyped` porte les valeurs recopiées telles quelles : champs inconnus
/// en mode pass-through et primitive `any`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateValue),
    Array(Vec<TypedValue>),
    Object(BTreeMap<String, TypedValue>),
    Untyped(Value),
}

impl TypedValue {
    /// Sorte de la valeur, pour les messages
    pub fn kind(&self) -> &'static str {
        match self {
            TypedValue::Null => "null",
            TypedValue::Bool(_) => "boolean",
            TypedValue::Number(_) => "number",
            TypedValue::String(_) => "string",
            TypedValue::Date(_) => "Date",
            TypedValue::Array(_) => "array",
            TypedValue::Object(_) => "object",
            TypedValue::Untyped(_) => "any",
        }
    }

    /// Accès à un champ (nom cible) d'un objet typé
    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        match self {
            TypedValue::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            TypedValue::Date(d) => Some(d.raw()),
            _ => None,
        }
    }

    /// Convertit en JSON en gardant les noms cibles.
    /// Les dates redeviennent leur chaîne brute.
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Null => Value::Null,
            TypedValue::Bool(b) => Value::Bool(*b),
            TypedValue::Number(n) => Value::Number(n.clone()),
            TypedValue::String(s) => Value::String(s.clone()),
            TypedValue::Date(d) => Value::String(d.raw.clone()),
            TypedValue::Array(items) => Value::Array(items.iter().map(TypedValue::to_json).collect()),
            TypedValue::Object(fields) => Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            TypedValue::Untyped(v) => v.clone(),
        }
    }
}

/// Relève un JSON brut en TypedValue SANS schéma.
///
/// Aucune chaîne n'est promue en Date : seul le cast sait qu'un champ est
/// une date.
impl From<Value> for TypedValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => TypedValue::Null,
            Value::Bool(b) => TypedValue::Bool(b),
            Value::Number(n) => TypedValue::Number(n),
            Value::String(s) => TypedValue::String(s),
            Value::Array(items) => TypedValue::Array(items.into_iter().map(TypedValue::from).collect()),
            Value::Object(fields) => TypedValue::Object(
                fields.into_iter().map(|(k, v)| (k, TypedValue::from(v))).collect(),
            ),
        }
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypedValue::Null => serializer.serialize_unit(),
            TypedValue::Bool(b) => serializer.serialize_bool(*b),
            TypedValue::Number(n) => n.serialize(serializer),
            TypedValue::String(s) => serializer.serialize_str(s),
            TypedValue::Date(d) => serializer.serialize_str(&d.raw),
            TypedValue::Array(items) => serializer.collect_seq(items),
            TypedValue::Object(fields) => serializer.collect_map(fields),
            TypedValue::Untyped(v) => v.serialize(serializer),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
