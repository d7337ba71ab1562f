// =============================================================================
// QUAKEMAP — Validation de flux sismiques et classification par pays
// =============================================================================
//
// QuakeMap prend deux documents GeoJSON déjà récupérés (les séismes, les
// polygones de pays), vérifie leur forme contre des schémas déclaratifs,
// rattache chaque séisme au pays qui le contient, puis dérive le filtre
// qu'une couche de rendu applique pour n'afficher qu'un sous-ensemble.
//
// Architecture :
//   core/     → Le moteur de schémas pur (cast / uncast, aucune géométrie)
//   geo/      → Classification spatiale et filtre (aucun schéma)
//   pipeline  → Le pont entre les deux, du texte JSON au texte JSON
//   config    → Réglages du classificateur
//   logging   → Installation du subscriber tracing (côté hôte)
//
// La bibliothèque ne fait aucune I/O : l'hôte lit et écrit les fichiers.
//
// =============================================================================

pub mod core;
pub mod geo;
pub mod config;
pub mod logging;
pub mod pipeline;
