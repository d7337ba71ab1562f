// =============================================================================
// CORE — Le moteur de schémas (validation + conversion du JSON)
// =============================================================================
//
// Ce module regroupe tout ce qui transforme un JSON non typé en valeur
// garantie conforme, et inversement. Aucune géométrie, aucune I/O.
//
// Architecture :
//   typeside  → les primitives et les valeurs typées (TypedValue)
//   schema    → les nœuds de schéma et le pretty-printer des types
//   registry  → le registre immuable des schémas nommés
//   validate  → la résolution des références à la construction
//   cast      → JSON → TypedValue, avec erreurs localisées
//   uncast    → TypedValue → JSON (noms de fil, dates d'origine)
//   catalog   → les schémas intégrés (séismes, pays)
//
// =============================================================================

pub mod typeside;
pub mod schema;
pub mod registry;
pub mod validate;
pub mod cast;
pub mod uncast;
pub mod catalog;
