// =============================================================================
// SCHEMA — La description déclarative d'une forme de données
// =============================================================================
//
// Un SchemaNode est un ensemble FERMÉ de variantes :
//   - Primitive(nom)        → string, number, integer, boolean, Date, any, undefined
//   - Literal(valeur)       → une valeur exacte (champs-étiquettes : "Point")
//   - Array(schéma)         → une séquence homogène
//   - Union([schémas...])   → alternatives essayées DANS L'ORDRE
//   - Enum([valeurs...])    → un ensemble de littéraux admis
//   - Object(champs, pol.)  → des champs nommés + politique pour les inconnus
//   - Reference(nom)        → renvoi vers un schéma nommé du registre
//
// ANALOGIE : c'est l'équivalent d'une déclaration de type TypeScript, mais
// interprétée à l'exécution au lieu d'être vérifiée à la compilation.
//
// EXEMPLE :
//
//   Geometry = Object {
//       type        : Enum ["Point"]
//       coordinates : Array(number)
//   } (champs inconnus : rejet)
//
//   "nullable X" s'écrit Union(X, Literal(null)) ;
//   "optional X" s'écrit Union(undefined, X).
//
// Les schémas sont construits UNE fois (voir registry) puis partagés en
// lecture seule par tous les appels de cast.
//
// =============================================================================

use std::fmt;

use serde_json::Value;

use super::typeside::Primitive;

/// Un nœud de schéma.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Primitive(Primitive),
    Literal(Value),
    Array(Box<SchemaNode>),
    /// Alternatives essayées dans l'ordre déclaré ; la première qui réussit gagne
    Union(Vec<SchemaNode>),
    Enum(Vec<Value>),
    Object(ObjectSchema),
    /// Nom d'un schéma du registre
    Reference(String),
}

impl SchemaNode {
    pub fn string() -> Self {
        SchemaNode::Primitive(Primitive::String)
    }

    pub fn number() -> Self {
        SchemaNode::Primitive(Primitive::Number)
    }

    pub fn integer() -> Self {
        SchemaNode::Primitive(Primitive::Integer)
    }

    pub fn boolean() -> Self {
        SchemaNode::Primitive(Primitive::Boolean)
    }

    pub fn date() -> Self {
        SchemaNode::Primitive(Primitive::Date)
    }

    pub fn any() -> Self {
        SchemaNode::Primitive(Primitive::Any)
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        SchemaNode::Literal(value.into())
    }

    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array(Box::new(items))
    }

    pub fn union(alternatives: Vec<SchemaNode>) -> Self {
        SchemaNode::Union(alternatives)
    }

    /// X ou null : Union(X, Literal(null))
    pub fn nullable(inner: SchemaNode) -> Self {
        SchemaNode::Union(vec![inner, SchemaNode::Literal(Value::Null)])
    }

    /// X ou champ absent : Union(undefined, X)
    pub fn optional(inner: SchemaNode) -> Self {
        SchemaNode::Union(vec![SchemaNode::Primitive(Primitive::Undefined), inner])
    }

    /// Énumération de littéraux textuels
    pub fn enumeration<I, S>(cases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaNode::Enum(cases.into_iter().map(|c| Value::String(c.into())).collect())
    }

    pub fn reference(name: &str) -> Self {
        SchemaNode::Reference(name.to_string())
    }

    /// Objet sans champ déclaré dont toutes les valeurs suivent `values`
    pub fn map(values: SchemaNode) -> Self {
        SchemaNode::Object(ObjectSchema::new(Additional::Typed(Box::new(values))))
    }

    /// Description lisible du type attendu (règle du pretty-printer) :
    /// une primitive affiche son nom, un littéral sa valeur, une union
    /// "one of [...]".
    pub fn describe(&self) -> String {
        match self {
            SchemaNode::Primitive(p) => p.name().to_string(),
            SchemaNode::Literal(v) => v.to_string(),
            SchemaNode::Array(_) => "array".to_string(),
            SchemaNode::Union(alternatives) => match alternatives.as_slice() {
                [SchemaNode::Primitive(Primitive::Undefined), inner] => {
                    format!("an optional {}", inner.describe())
                }
                _ => one_of(alternatives.iter().map(SchemaNode::describe)),
            },
            SchemaNode::Enum(cases) => one_of(cases.iter().map(Value::to_string)),
            SchemaNode::Object(_) => "object".to_string(),
            SchemaNode::Reference(name) => name.clone(),
        }
    }
}

fn one_of(items: impl Iterator<Item = String>) -> String {
    format!("one of [{}]", items.collect::<Vec<_>>().join(", "))
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Politique pour les champs présents en entrée mais non déclarés.
#[derive(Debug, Clone, PartialEq)]
pub enum Additional {
    /// Un champ inconnu fait échouer le cast
    Reject,
    /// Le champ est recopié tel quel, sans typage
    PassThrough,
    /// Chaque champ inconnu est casté contre ce schéma (type "map")
    Typed(Box<SchemaNode>),
}

/// Un champ déclaré : nom sur le fil (JSON) → nom cible (valeur typée).
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub wire: String,
    pub target: String,
    pub schema: SchemaNode,
}

/// Un objet : champs déclarés (dans l'ordre) + politique pour les inconnus.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    pub fields: Vec<Field>,
    pub additional: Additional,
}

impl ObjectSchema {
    pub fn new(additional: Additional) -> Self {
        ObjectSchema {
            fields: Vec::new(),
            additional,
        }
    }

    pub fn strict() -> Self {
        ObjectSchema::new(Additional::Reject)
    }

    pub fn open() -> Self {
        ObjectSchema::new(Additional::PassThrough)
    }

    /// Champ dont le nom cible est identique au nom JSON
    pub fn field(self, name: &str, schema: SchemaNode) -> Self {
        self.renamed(name, name, schema)
    }

    /// Champ renommé : `wire` en JSON, `target` dans la valeur typée
    pub fn renamed(mut self, wire: &str, target: &str, schema: SchemaNode) -> Self {
        self.fields.push(Field {
            wire: wire.to_string(),
            target: target.to_string(),
            schema,
        });
        self
    }

    pub fn by_wire(&self, wire: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.wire == wire)
    }

    pub fn by_target(&self, target: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.target == target)
    }
}

impl From<ObjectSchema> for SchemaNode {
    fn from(object: ObjectSchema) -> Self {
        SchemaNode::Object(object)
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_primitives_and_literals() {
        assert_eq!(SchemaNode::number().describe(), "number");
        assert_eq!(SchemaNode::literal("Point").describe(), "\"Point\"");
        assert_eq!(SchemaNode::Literal(Value::Null).describe(), "null");
    }

    #[test]
    fn test_describe_unions() {
        let n = SchemaNode::nullable(SchemaNode::number());
        assert_eq!(n.describe(), "one of [number, null]");

        let o = SchemaNode::optional(SchemaNode::string());
        assert_eq!(o.describe(), "an optional string");
    }

    #[test]
    fn test_describe_enum() {
        let e = SchemaNode::enumeration(["green", "yellow"]);
        assert_eq!(e.describe(), r#"one of ["green", "yellow"]"#);
    }

    #[test]
    fn test_object_lookup_by_both_names() {
        let o = ObjectSchema::strict()
            .field("mag", SchemaNode::number())
            .renamed("magType", "mag_type", SchemaNode::string());
        assert_eq!(o.by_wire("magType").map(|f| f.target.as_str()), Some("mag_type"));
        assert_eq!(o.by_target("mag_type").map(|f| f.wire.as_str()), Some("magType"));
        assert!(o.by_wire("mag_type").is_none());
    }

    #[test]
    fn test_map_is_object_with_typed_additional() {
        let m = SchemaNode::map(SchemaNode::integer());
        match m {
            SchemaNode::Object(o) => {
                assert!(o.fields.is_empty());
                assert_eq!(o.additional, Additional::Typed(Box::new(SchemaNode::integer())));
            }
            other => panic!("attendu un objet, reçu {:?}", other),
        }
    }
}
