// =============================================================================
// GEO — Classification spatiale des séismes
// =============================================================================
//
// Ce module rattache chaque séisme (Point) au pays (Polygon ou
// MultiPolygon) qui le contient, puis dérive le filtre d'affichage.
//
// Il ne dépend que du modèle GeoJSON (feature), jamais du moteur de
// schémas : c'est le pipeline qui fait le pont entre les deux.
//
// Grâce au trait RegionLocator, la stratégie de recherche est
// interchangeable :
//   - LinearScan : essai séquentiel, premier polygone contenant gagne
//   - un index spatial (grille, R-tree) pourra s'y brancher plus tard
//
// =============================================================================

pub mod feature;
pub mod polygon;
pub mod classify;
pub mod filter;

use polygon::Coord;

/// Trouve la région qui contient un point.
///
/// Le contrat est celui du premier polygone contenant, dans l'ordre de la
/// collection de régions : une implémentation indexée doit rendre
/// exactement le même nom que la recherche séquentielle.
pub trait RegionLocator {
    /// Nom de la région contenant `point`, ou `None` (point hors de toute région)
    fn locate(&self, point: Coord) -> Option<&str>;

    /// Nom de la stratégie, pour les logs
    fn name(&self) -> &str;
}
