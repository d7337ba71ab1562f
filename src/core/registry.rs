// =============================================================================
// REGISTRY — Le registre des schémas nommés
// =============================================================================
//
// Le registre associe un nom à un SchemaNode. Il est construit UNE fois
// (RegistryBuilder → build, qui passe par validate) puis n'est plus
// jamais modifié : il peut être partagé sans synchronisation entre autant
// d'appelants qu'on veut.
//
// Les Reference sont résolues par recherche de nom, jamais par identité de
// type. Comme build() a vérifié que tous les noms existent, la résolution
// ne peut pas échouer pendant un cast.
//
// =============================================================================

use std::collections::HashMap;

use super::schema::SchemaNode;
use super::validate::{validate_definitions, SchemaResolutionError};

/// Registre immuable de schémas nommés.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, SchemaNode>,
}

impl SchemaRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Le schéma enregistré sous ce nom
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Noms enregistrés, triés
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Suit les Reference jusqu'à un nœud structurel.
    ///
    /// Retourne le nœud final et le DERNIER nom de référence traversé
    /// (utilisé comme "parent" dans les diagnostics). `None` seulement si
    /// un nom manque, ce que build() exclut.
    pub fn resolve<'a>(&'a self, mut node: &'a SchemaNode) -> Option<(&'a SchemaNode, Option<&'a str>)> {
        let mut via = None;
        while let SchemaNode::Reference(name) = node {
            via = Some(name.as_str());
            node = self.schemas.get(name)?;
        }
        Some((node, via))
    }
}

/// Accumulateur de définitions avant validation.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    definitions: Vec<(String, SchemaNode)>,
}

impl RegistryBuilder {
    /// Ajoute un schéma nommé
    pub fn define(&mut self, name: &str, schema: impl Into<SchemaNode>) -> &mut Self {
        self.definitions.push((name.to_string(), schema.into()));
        self
    }

    /// Valide toutes les références puis gèle le registre.
    pub fn build(self) -> Result<SchemaRegistry, Vec<SchemaResolutionError>> {
        validate_definitions(&self.definitions)?;
        Ok(SchemaRegistry {
            schemas: self.definitions.into_iter().collect(),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ObjectSchema;

    #[test]
    fn test_build_and_resolve_chain() {
        let mut b = SchemaRegistry::builder();
        b.define("Status", SchemaNode::enumeration(["automatic", "reviewed"]))
            .define("CurrentStatus", SchemaNode::reference("Status"))
            .define("Props", ObjectSchema::strict().field("status", SchemaNode::reference("CurrentStatus")));
        let reg = b.build().unwrap();

        assert_eq!(reg.len(), 3);
        assert_eq!(reg.names(), vec!["CurrentStatus", "Props", "Status"]);

        let alias = SchemaNode::reference("CurrentStatus");
        let (node, via) = reg.resolve(&alias).unwrap();
        assert!(matches!(node, SchemaNode::Enum(_)));
        assert_eq!(via, Some("Status"));
    }

    #[test]
    fn test_build_rejects_dangling_reference() {
        let mut b = SchemaRegistry::builder();
        b.define("Feature", ObjectSchema::strict().field("geometry", SchemaNode::reference("Geometry")));
        let errors = b.build().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Geometry"));
    }

    #[test]
    fn test_build_rejects_union_self_cycle() {
        let mut b = SchemaRegistry::builder();
        b.define("A", SchemaNode::union(vec![SchemaNode::reference("A"), SchemaNode::string()]));
        let errors = b.build().unwrap_err();
        assert!(matches!(errors[0], SchemaResolutionError::ReferenceCycle(_)));
    }

    #[test]
    fn test_resolve_structural_node_is_identity() {
        let reg = SchemaRegistry::builder().build().unwrap();
        let n = SchemaNode::string();
        let (node, via) = reg.resolve(&n).unwrap();
        assert_eq!(node, &n);
        assert!(via.is_none());
    }
}
