// =============================================================================
// VALIDATE — Vérification du registre de schémas à la construction
// =============================================================================
//
// Ce module vérifie qu'un ensemble de définitions nommées est cohérent
// AVANT tout cast :
//   - Toute Reference pointe vers un nom défini
//   - Aucun nom n'est défini deux fois
//   - Aucune chaîne de Reference ne boucle sur elle-même sans passer par
//     une structure (A = ref B, B = ref A ne se résout jamais, pas plus
//     que A = Union(ref A, string))
//   - Aucune Union n'est vide (elle ne pourrait jamais réussir)
//
// Une erreur ici est un DÉFAUT DE CONSTRUCTION (fatal au démarrage), pas
// une erreur de donnée : elle ne doit jamais apparaître au milieu d'un cast.
//
// =============================================================================

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::schema::{Additional, SchemaNode};

/// Erreur de résolution du registre
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaResolutionError {
    #[error("schéma '{schema}' : la référence '{reference}' n'existe pas dans le registre")]
    UnknownReference { schema: String, reference: String },

    #[error("schéma '{0}' défini plusieurs fois")]
    DuplicateName(String),

    #[error("cycle de références sans structure : {}", .0.join(" -> "))]
    ReferenceCycle(Vec<String>),

    #[error("schéma '{0}' : union sans alternative")]
    EmptyUnion(String),
}

/// Vérifie un ensemble de définitions nommées.
///
/// Collecte TOUTES les erreurs plutôt que de s'arrêter à la première, pour
/// qu'un catalogue cassé se répare en une passe.
pub fn validate_definitions(
    definitions: &[(String, SchemaNode)],
) -> Result<(), Vec<SchemaResolutionError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for (name, _) in definitions {
        if !seen.insert(name.as_str()) {
            errors.push(SchemaResolutionError::DuplicateName(name.clone()));
        }
    }

    for (name, node) in definitions {
        check_node(name, node, &seen, &mut errors);
    }

    // Cycles qui ne consomment aucune entrée : une Reference atteinte
    // directement ou à travers des Union, jamais sous un Array ou un Object.
    let edges: HashMap<&str, Vec<&str>> = definitions
        .iter()
        .map(|(name, node)| {
            let mut out = Vec::new();
            unguarded_references(node, &mut out);
            (name.as_str(), out)
        })
        .collect();

    let mut finished: HashSet<&str> = HashSet::new();
    let mut reported: HashSet<&str> = HashSet::new();
    for (name, _) in definitions {
        let mut stack = Vec::new();
        find_cycles(name, &edges, &mut stack, &mut finished, &mut reported, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Noms atteints sans descendre dans un Array ou un Object
fn unguarded_references<'a>(node: &'a SchemaNode, out: &mut Vec<&'a str>) {
    match node {
        SchemaNode::Reference(name) => out.push(name.as_str()),
        SchemaNode::Union(alternatives) => {
            for alt in alternatives {
                unguarded_references(alt, out);
            }
        }
        _ => {}
    }
}

fn find_cycles<'a>(
    name: &'a str,
    edges: &HashMap<&'a str, Vec<&'a str>>,
    stack: &mut Vec<&'a str>,
    finished: &mut HashSet<&'a str>,
    reported: &mut HashSet<&'a str>,
    errors: &mut Vec<SchemaResolutionError>,
) {
    if finished.contains(name) {
        return;
    }
    if let Some(pos) = stack.iter().position(|n| *n == name) {
        let cycle = &stack[pos..];
        // Chaque cycle n'est signalé qu'une fois
        if cycle.iter().any(|n| !reported.contains(n)) {
            reported.extend(cycle.iter().copied());
            let mut names: Vec<String> = cycle.iter().map(|n| n.to_string()).collect();
            names.push(name.to_string());
            errors.push(SchemaResolutionError::ReferenceCycle(names));
        }
        return;
    }
    stack.push(name);
    for &next in edges.get(name).into_iter().flatten() {
        find_cycles(next, edges, stack, finished, reported, errors);
    }
    stack.pop();
    finished.insert(name);
}

fn check_node(
    schema: &str,
    node: &SchemaNode,
    defined: &HashSet<&str>,
    errors: &mut Vec<SchemaResolutionError>,
) {
    match node {
        SchemaNode::Reference(reference) => {
            if !defined.contains(reference.as_str()) {
                errors.push(SchemaResolutionError::UnknownReference {
                    schema: schema.to_string(),
                    reference: reference.clone(),
                });
            }
        }
        SchemaNode::Array(items) => check_node(schema, items, defined, errors),
        SchemaNode::Union(alternatives) => {
            if alternatives.is_empty() {
                errors.push(SchemaResolutionError::EmptyUnion(schema.to_string()));
            }
            for alt in alternatives {
                check_node(schema, alt, defined, errors);
            }
        }
        SchemaNode::Object(object) => {
            for field in &object.fields {
                check_node(schema, &field.schema, defined, errors);
            }
            if let Additional::Typed(values) = &object.additional {
                check_node(schema, values, defined, errors);
            }
        }
        SchemaNode::Primitive(_) | SchemaNode::Literal(_) | SchemaNode::Enum(_) => {}
    }
}
