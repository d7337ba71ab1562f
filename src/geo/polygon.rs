// =============================================================================
// POLYGON — Anneaux validés et test point-dans-polygone
// =============================================================================
//
// RÈGLE UNIQUE : pair-impair (even-odd) par lancer de rayon horizontal.
//   Un point est dans un anneau si une demi-droite partant vers +x coupe
//   ses arêtes un nombre impair de fois.
//
// Un polygone = un anneau extérieur + des trous (anneaux intérieurs) :
//   dedans(p) = dedans(extérieur) ET dehors(chaque trou)
//
// BORDS : un point posé exactement sur une arête ou un sommet (extérieur
// OU trou) est tranché par BoundaryRule, avant le lancer de rayon, pour
// que le résultat ne dépende pas du sens de parcours de l'anneau.
//
//   (0,10)────(10,10)
//     │          │      (5,5)  → dedans
//     │    •     │      (0,0)  → bord : dedans si Inclusive
//     │          │      (11,5) → dehors (rejeté dès la boîte englobante)
//   (0,0)─────(10,0)
//
// =============================================================================

use thiserror::Error;

use super::feature::{Geometry, Position, RingPositions};
use crate::config::{BoundaryRule, RingPolicy};

/// Tolérance absolue du test "sur l'arête"
const EDGE_EPSILON: f64 = 1e-12;

/// Un anneau doit compter au moins 4 positions (triangle fermé)
pub const MIN_RING_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("anneau {ring} : {len} positions, il en faut au moins {MIN_RING_LEN}")]
    RingTooShort { ring: usize, len: usize },

    #[error("anneau {ring} non fermé (premier et dernier points différents)")]
    RingNotClosed { ring: usize },

    #[error("anneau {ring}, position {index} : il faut deux coordonnées finies")]
    BadPosition { ring: usize, index: usize },

    #[error("polygone sans anneau")]
    EmptyPolygon,

    #[error("région n°{index} : géométrie {kind}, un polygone est attendu")]
    NotAreal { index: usize, kind: &'static str },

    #[error("région n°{index} : propriété texte \"{property}\" absente")]
    MissingRegionName { index: usize, property: String },

    #[error("région n°{index} ({name}) : {source}")]
    InvalidRegion {
        index: usize,
        name: String,
        source: Box<GeometryError>,
    },
}

/// Un point du plan (x = longitude, y = latitude)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Coord { x, y }
    }

    /// Les deux premières coordonnées d'une position, si finies
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [x, y, ..] if x.is_finite() && y.is_finite() => Some(Coord::new(*x, *y)),
            _ => None,
        }
    }
}

/// Boîte englobante, bords inclus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Coord,
    pub max: Coord,
}

impl BoundingBox {
    fn of(coords: &[Coord]) -> Self {
        let mut bbox = BoundingBox {
            min: Coord::new(f64::INFINITY, f64::INFINITY),
            max: Coord::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        };
        for c in coords {
            bbox.min.x = bbox.min.x.min(c.x);
            bbox.min.y = bbox.min.y.min(c.y);
            bbox.max.x = bbox.max.x.max(c.x);
            bbox.max.y = bbox.max.y.max(c.y);
        }
        bbox
    }

    fn union(self, other: BoundingBox) -> Self {
        BoundingBox {
            min: Coord::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Coord::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn contains(&self, p: Coord) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Un anneau validé : au moins 4 positions, fermé.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    coords: Vec<Coord>,
}

impl Ring {
    /// Valide un anneau GeoJSON. `ring` n'est là que pour les messages.
    pub fn from_positions(
        positions: &[Position],
        ring: usize,
        policy: RingPolicy,
    ) -> Result<Self, GeometryError> {
        let mut coords = positions
            .iter()
            .enumerate()
            .map(|(index, p)| Coord::from_position(p).ok_or(GeometryError::BadPosition { ring, index }))
            .collect::<Result<Vec<_>, _>>()?;

        if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
            if first != last {
                match policy {
                    RingPolicy::Reject => return Err(GeometryError::RingNotClosed { ring }),
                    RingPolicy::AutoClose => coords.push(first),
                }
            }
        }

        if coords.len() < MIN_RING_LEN {
            return Err(GeometryError::RingTooShort { ring, len: coords.len() });
        }
        Ok(Ring { coords })
    }

    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    /// Le point est-il sur une arête (sommets compris) ?
    pub fn on_boundary(&self, p: Coord) -> bool {
        self.coords.windows(2).any(|edge| on_segment(edge[0], edge[1], p))
    }

    /// Pair-impair strict : n'a de sens que si `on_boundary(p)` est faux.
    pub fn encloses(&self, p: Coord) -> bool {
        let mut inside = false;
        for edge in self.coords.windows(2) {
            let (a, b) = (edge[0], edge[1]);
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

fn on_segment(a: Coord, b: Coord, p: Coord) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }
    p.x >= a.x.min(b.x) - EDGE_EPSILON
        && p.x <= a.x.max(b.x) + EDGE_EPSILON
        && p.y >= a.y.min(b.y) - EDGE_EPSILON
        && p.y <= a.y.max(b.y) + EDGE_EPSILON
}

/// Un polygone préparé : extérieur, trous, boîte englobante.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPolygon {
    outer: Ring,
    holes: Vec<Ring>,
    bbox: BoundingBox,
}

impl PreparedPolygon {
    pub fn from_rings(rings: &[RingPositions], policy: RingPolicy) -> Result<Self, GeometryError> {
        let mut validated = rings
            .iter()
            .enumerate()
            .map(|(i, ring)| Ring::from_positions(ring, i, policy))
            .collect::<Result<Vec<_>, _>>()?;
        if validated.is_empty() {
            return Err(GeometryError::EmptyPolygon);
        }
        let outer = validated.remove(0);
        let bbox = BoundingBox::of(outer.coords());
        Ok(PreparedPolygon {
            outer,
            holes: validated,
            bbox,
        })
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn contains(&self, p: Coord, rule: BoundaryRule) -> bool {
        if !self.bbox.contains(p) {
            return false;
        }
        if self.outer.on_boundary(p) {
            return rule.includes_boundary();
        }
        if !self.outer.encloses(p) {
            return false;
        }
        for hole in &self.holes {
            // Le bord d'un trou est aussi un bord du polygone
            if hole.on_boundary(p) {
                return rule.includes_boundary();
            }
            if hole.encloses(p) {
                return false;
            }
        }
        true
    }
}

/// Une surface : un ou plusieurs polygones (Polygon ou MultiPolygon).
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedArea {
    polygons: Vec<PreparedPolygon>,
    bbox: BoundingBox,
}

impl PreparedArea {
    /// Prépare une géométrie surfacique ; `None` pour un Point.
    pub fn from_geometry(geometry: &Geometry, policy: RingPolicy) -> Option<Result<Self, GeometryError>> {
        let polygons = match geometry {
            Geometry::Point { .. } => return None,
            Geometry::Polygon { coordinates } => {
                PreparedPolygon::from_rings(coordinates, policy).map(|p| vec![p])
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .map(|rings| PreparedPolygon::from_rings(rings, policy))
                .collect(),
        };
        Some(polygons.and_then(PreparedArea::from_polygons))
    }

    fn from_polygons(polygons: Vec<PreparedPolygon>) -> Result<Self, GeometryError> {
        let bbox = polygons
            .iter()
            .map(PreparedPolygon::bbox)
            .reduce(BoundingBox::union)
            .ok_or(GeometryError::EmptyPolygon)?;
        Ok(PreparedArea { polygons, bbox })
    }

    pub fn contains(&self, p: Coord, rule: BoundaryRule) -> bool {
        self.bbox.contains(p) && self.polygons.iter().any(|poly| poly.contains(p, rule))
    }
}
