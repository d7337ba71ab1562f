// =============================================================================
// LOGGING — Installation du subscriber tracing
// =============================================================================
//
// La bibliothèque se contente d'émettre des événements `tracing` ; seul
// l'hôte (le binaire) installe un subscriber. RUST_LOG a priorité sur le
// niveau configuré.
//
// =============================================================================

use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Niveau simple ("info") ou filtre complet ("info,quakemap=debug")
    pub level: Option<String>,
    /// Une ligne JSON par événement plutôt que du texte
    pub json: bool,
    /// Affiche la cible (module) de chaque événement
    pub with_targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: Some("info".to_owned()),
            json: false,
            with_targets: false,
        }
    }
}

/// Installe le subscriber global. Les appels suivants sont sans effet.
pub fn init(cfg: &LogConfig) {
    INIT.call_once(|| {
        let level = cfg.level.clone().unwrap_or_else(|| "info".into());
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = if cfg.json {
            fmt::layer()
                .with_target(cfg.with_targets)
                .with_writer(std::io::stderr)
                .json()
                .boxed()
        } else {
            fmt::layer()
                .with_target(cfg.with_targets)
                .with_writer(std::io::stderr)
                .boxed()
        };

        let subscriber = Registry::default().with(filter).with(fmt_layer);
        // Un subscriber déjà installé par l'hôte n'est pas une erreur
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
