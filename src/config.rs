// =============================================================================
// CONFIG — Réglages du classificateur spatial
// =============================================================================
//
// Trois choix que les données ne tranchent pas d'elles-mêmes :
//   ring_policy     → un anneau non fermé est-il rejeté ou refermé ?
//   boundary        → un point posé exactement sur un bord est-il dedans ?
//   region_property → quelle propriété des polygones porte le nom de région ?
//
// Tous les champs ont une valeur par défaut : un fichier JSON vide ({})
// est une configuration valide.
//
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::core::catalog::DEFAULT_REGION_PROPERTY;

/// Traitement d'un anneau dont le premier et le dernier point diffèrent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingPolicy {
    /// L'anneau est refusé (GeometryError::RingNotClosed)
    #[default]
    Reject,
    /// Le premier point est recopié en fin d'anneau
    AutoClose,
}

/// Statut d'un point situé exactement sur une arête ou un sommet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryRule {
    /// Le bord compte comme intérieur : un séisme sur une côte n'est pas perdu
    #[default]
    Inclusive,
    /// Le bord compte comme extérieur
    Exclusive,
}

impl BoundaryRule {
    pub fn includes_boundary(self) -> bool {
        matches!(self, BoundaryRule::Inclusive)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub ring_policy: RingPolicy,
    pub boundary: BoundaryRule,
    pub region_property: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            ring_policy: RingPolicy::default(),
            boundary: BoundaryRule::default(),
            region_property: DEFAULT_REGION_PROPERTY.to_string(),
        }
    }
}

impl ClassifierConfig {
    /// Lit une configuration JSON ; les champs absents gardent leur défaut
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
