// =============================================================================
// FILTER — Sélection du sous-ensemble visible
// =============================================================================
//
// Une sélection est soit "tout montrer", soit un nom de région :
//
//   ""  ou "Any"  → ShowAll        → garde hide == false
//   "Chile"       → Region(Chile)  → garde region == "Chile" (hide ignoré)
//
// Le prédicat est pur et total : il ne lève jamais d'erreur, et se
// recalcule à tout moment depuis le couple (collection, sélection).
// La forme déclarative ["==", clé, valeur] est celle qu'attend une couche
// de rendu cartographique.
//
// =============================================================================

use serde_json::{json, Value};

use super::feature::{props, Feature, FeatureCollection};

/// Le libellé sentinelle "tout montrer"
pub const ANY: &str = "Any";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    ShowAll,
    Region(String),
}

impl Selection {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | ANY => Selection::ShowAll,
            name => Selection::Region(name.to_string()),
        }
    }
}

/// Le prédicat dérivé d'une sélection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    selection: Selection,
}

impl Filter {
    pub fn new(selection: Selection) -> Self {
        Filter { selection }
    }

    pub fn from_selection(raw: &str) -> Self {
        Filter::new(Selection::parse(raw))
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn matches(&self, feature: &Feature) -> bool {
        match &self.selection {
            Selection::ShowAll => feature.hidden() == Some(false),
            Selection::Region(name) => feature.region() == Some(name.as_str()),
        }
    }

    /// ["==", "hide", false] ou ["==", "region", nom]
    pub fn expression(&self) -> Value {
        match &self.selection {
            Selection::ShowAll => json!(["==", props::HIDE, false]),
            Selection::Region(name) => json!(["==", props::REGION, name]),
        }
    }
}

/// Les features retenues, dans l'ordre d'origine
pub fn filter_features<'a>(events: &'a FeatureCollection, filter: &'a Filter) -> impl Iterator<Item = &'a Feature> + 'a {
    events.iter().filter(move |f| filter.matches(f))
}

/// Copie du sous-ensemble visible ; les membres de premier niveau suivent
pub fn select(events: &FeatureCollection, filter: &Filter) -> FeatureCollection {
    FeatureCollection {
        tag: events.tag,
        features: filter_features(events, filter).cloned().collect(),
        extra: events.extra.clone(),
    }
}

/// Noms de régions, dans l'ordre de la collection, sans doublon
pub fn region_names(regions: &FeatureCollection, property: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in regions.iter().filter_map(|f| f.property(property).and_then(Value::as_str)) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Les choix proposés à l'utilisateur : "Any" d'abord, puis les régions
pub fn selection_options(regions: &FeatureCollection, property: &str) -> Vec<String> {
    std::iter::once(ANY.to_string())
        .chain(region_names(regions, property).into_iter().filter(|n| n != ANY))
        .collect()
}
