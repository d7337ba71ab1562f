// =============================================================================
// QUAKEMAP — Point d'entrée : classer un flux de séismes par pays
// =============================================================================
//
// Usage :
//   quakemap events.geojson countries.geojson --select Chile
//
//   1. Charger et valider les polygones de pays (erreur fatale)
//   2. Charger, valider et classer les séismes (une erreur de cast est
//      journalisée et l'affichage continue avec un jeu vide)
//   3. Écrire sur stdout la sous-collection visible pour la sélection
//
// =============================================================================

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use quakemap::config::ClassifierConfig;
use quakemap::geo::feature::FeatureCollection;
use quakemap::logging::{self, LogConfig};
use quakemap::pipeline::QuakeMap;

#[derive(Parser, Debug)]
#[command(name = "quakemap", about = "Classe des séismes GeoJSON par pays et filtre la sélection")]
struct Args {
    /// Flux de séismes (GeoJSON FeatureCollection de points)
    events: PathBuf,
    /// Polygones de pays (GeoJSON FeatureCollection)
    regions: PathBuf,
    /// Pays à afficher, ou "Any" pour tout ce qui n'est pas masqué
    #[arg(short, long, default_value = "Any")]
    select: String,
    /// Réglages du classificateur (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Liste les sélections possibles au lieu d'écrire la collection
    #[arg(long)]
    list_regions: bool,
    /// Logs au format JSON
    #[arg(long)]
    json_logs: bool,
    /// Niveau ou filtre de logs (RUST_LOG a priorité)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init(&LogConfig {
        level: args.log_level.clone().or_else(|| LogConfig::default().level),
        json: args.json_logs,
        with_targets: false,
    });

    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("lecture de la configuration {}", path.display()))?;
            ClassifierConfig::from_json_str(&text)
                .with_context(|| format!("configuration invalide {}", path.display()))?
        }
        None => ClassifierConfig::default(),
    };

    let regions_text = fs::read_to_string(&args.regions)
        .with_context(|| format!("lecture des régions {}", args.regions.display()))?;
    let map = QuakeMap::load(&regions_text, config).context("chargement des régions")?;
    info!(regions = map.regions().len(), "régions prêtes");

    if args.list_regions {
        for option in map.selection_options() {
            println!("{}", option);
        }
        return Ok(());
    }

    let events_text = fs::read_to_string(&args.events)
        .with_context(|| format!("lecture des séismes {}", args.events.display()))?;
    let events = match map.ingest(&events_text) {
        Ok((events, _)) => events,
        Err(e) => {
            // Un flux invalide ne bloque pas l'affichage
            error!(error = %e, "flux de séismes rejeté, collection vide");
            FeatureCollection::default()
        }
    };

    let (visible, expression) = map.view(&events, &args.select);
    info!(
        selection = %args.select,
        filter = %expression,
        visible = visible.len(),
        total = events.len(),
        "filtre appliqué"
    );
    println!("{}", map.write(&visible).context("écriture de la collection")?);
    Ok(())
}
