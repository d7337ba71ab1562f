// =============================================================================
// CLASSIFY — Attribution d'une région à chaque séisme
// =============================================================================
//
// Pour chaque feature Point encore sans région :
//   1. on cherche le PREMIER polygone (dans l'ordre de la collection) qui
//      contient le point ;
//   2. s'il existe, on pose properties.region = son nom ;
//   3. sinon la région reste absente : ce n'est pas une erreur.
//
// Les polygones peuvent se chevaucher : le résultat dépend alors de
// l'ordre des régions, et cet ordre est respecté tel quel.
//
// Enrichissement temporel (calendrier UTC) à partir de properties.time :
//   year  → année grégorienne proleptique
//   month → mois, 0 = janvier
//   day   → jour de la semaine, 0 = dimanche
//
// EXEMPLE :
//   time = 0 → 1970-01-01T00:00:00Z, un jeudi → year 1970, month 0, day 4
//
// =============================================================================

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use super::feature::{props, Feature, FeatureCollection, Geometry};
use super::polygon::{Coord, GeometryError, PreparedArea};
use super::RegionLocator;
use crate::config::{BoundaryRule, ClassifierConfig};

/// Une région prête pour les tests de contenance
#[derive(Debug, Clone)]
pub struct PreparedRegion {
    pub name: String,
    area: PreparedArea,
}

impl PreparedRegion {
    pub fn contains(&self, p: Coord, rule: BoundaryRule) -> bool {
        self.area.contains(p, rule)
    }
}

/// Les régions préparées une fois pour toutes, dans l'ordre de la collection.
#[derive(Debug, Clone)]
pub struct RegionIndex {
    regions: Vec<PreparedRegion>,
}

impl RegionIndex {
    /// Valide et prépare chaque région. La première région invalide
    /// interrompt la construction.
    pub fn build(regions: &FeatureCollection, config: &ClassifierConfig) -> Result<Self, GeometryError> {
        let mut prepared = Vec::with_capacity(regions.len());
        for (index, feature) in regions.iter().enumerate() {
            let name = feature
                .property(&config.region_property)
                .and_then(Value::as_str)
                .ok_or_else(|| GeometryError::MissingRegionName {
                    index,
                    property: config.region_property.clone(),
                })?;
            let area = PreparedArea::from_geometry(&feature.geometry, config.ring_policy)
                .ok_or(GeometryError::NotAreal {
                    index,
                    kind: feature.geometry.kind(),
                })?
                .map_err(|e| GeometryError::InvalidRegion {
                    index,
                    name: name.to_string(),
                    source: Box::new(e),
                })?;
            prepared.push(PreparedRegion {
                name: name.to_string(),
                area,
            });
        }
        Ok(RegionIndex { regions: prepared })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PreparedRegion> {
        self.regions.iter()
    }
}

/// Recherche séquentielle : chaque région est essayée dans l'ordre, la
/// première qui contient le point gagne.
#[derive(Debug, Clone)]
pub struct LinearScan {
    index: RegionIndex,
    boundary: BoundaryRule,
}

impl LinearScan {
    pub fn new(index: RegionIndex, boundary: BoundaryRule) -> Self {
        LinearScan { index, boundary }
    }

    pub fn build(regions: &FeatureCollection, config: &ClassifierConfig) -> Result<Self, GeometryError> {
        Ok(LinearScan::new(RegionIndex::build(regions, config)?, config.boundary))
    }

    pub fn index(&self) -> &RegionIndex {
        &self.index
    }
}

impl RegionLocator for LinearScan {
    fn locate(&self, point: Coord) -> Option<&str> {
        self.index
            .iter()
            .find(|region| region.contains(point, self.boundary))
            .map(|region| region.name.as_str())
    }

    fn name(&self) -> &str {
        "linear-scan"
    }
}

/// Champs calendaires dérivés d'un horodatage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    pub year: i32,
    /// 0 = janvier
    pub month: u32,
    /// 0 = dimanche
    pub day: u32,
}

/// `None` si l'horodatage sort de la plage représentable
pub fn calendar_fields(epoch_millis: i64) -> Option<CalendarFields> {
    let instant: DateTime<Utc> = Utc.timestamp_millis_opt(epoch_millis).single()?;
    Some(CalendarFields {
        year: instant.year(),
        month: instant.month0(),
        day: instant.weekday().num_days_from_sunday(),
    })
}

/// Bilan d'une passe de classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub points: usize,
    /// Points qui viennent de recevoir une région
    pub matched: usize,
    /// Points qui avaient déjà une région
    pub already_classified: usize,
    pub unmatched: usize,
    /// Points sans `time` exploitable
    pub untimed: usize,
    /// Features ignorées (pas un Point, ou position invalide)
    pub skipped: usize,
}

/// Enrichit la collection sur place : région, hide, year, month, day.
/// L'ordre des features n'est jamais modifié.
pub fn classify<L: RegionLocator + ?Sized>(events: &mut FeatureCollection, locator: &L) -> ClassifyStats {
    let mut stats = ClassifyStats::default();
    for feature in events.features.iter_mut() {
        let Some(point) = point_of(feature) else {
            warn!(id = %feature.id(), geometry = feature.geometry.kind(), "feature sans position exploitable, ignorée");
            stats.skipped += 1;
            continue;
        };
        stats.points += 1;

        // Une région déjà posée n'est jamais recalculée
        if feature.region().is_some() {
            stats.already_classified += 1;
        } else if let Some(name) = locator.locate(point) {
            feature.set_property(props::REGION, name);
            stats.matched += 1;
        } else {
            stats.unmatched += 1;
        }

        if !feature.properties.contains_key(props::HIDE) {
            feature.set_property(props::HIDE, false);
        }

        match feature.time_millis().and_then(calendar_fields) {
            Some(fields) => {
                feature.set_property(props::YEAR, fields.year);
                feature.set_property(props::MONTH, fields.month);
                feature.set_property(props::DAY, fields.day);
            }
            None => {
                warn!(id = %feature.id(), "propriété time absente ou invalide, pas de champs calendaires");
                for key in [props::YEAR, props::MONTH, props::DAY] {
                    feature.properties.remove(key);
                }
                stats.untimed += 1;
            }
        }
    }
    debug!(
        locator = locator.name(),
        points = stats.points,
        matched = stats.matched,
        already = stats.already_classified,
        unmatched = stats.unmatched,
        "classification terminée"
    );
    stats
}

/// Variante par valeur de `classify`, pratique en fin de chaîne
pub fn enrich<L: RegionLocator + ?Sized>(mut events: FeatureCollection, locator: &L) -> FeatureCollection {
    classify(&mut events, locator);
    events
}

fn point_of(feature: &Feature) -> Option<Coord> {
    match &feature.geometry {
        Geometry::Point { coordinates } => Coord::from_position(coordinates),
        _ => None,
    }
}
