use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

use crate::types::MatchType;

/// Whole-service configuration. One immutable value, built at startup and
/// threaded into the components that need it; nothing in the scoring hot
/// loops reaches for process-global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub scoring: ScoringConfig,
    pub geo: GeoConfig,
    pub cache: CacheConfig,
    /// Synonym table, canonical base to surface variants.
    pub synonyms: HashMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            scoring: ScoringConfig::default(),
            geo: GeoConfig::default(),
            cache: CacheConfig::default(),
            synonyms: default_synonyms_fr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the external inverted-index service.
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:7700".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Scoring weights, thresholds, and the match-type priority table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub max_levenshtein_distance: usize,
    pub min_score: f64,

    // Field-score penalties
    pub w_missing: f64,
    pub w_fuzzy: f64,
    pub w_ratio: f64,
    pub w_extra_length: f64,

    // Name bonus
    pub bonus_max: f64,
    pub bonus_a_missing: f64,
    pub bonus_c_avgdist: f64,
    pub bonus_word_ratio_min: f64,
    pub bonus_extra_ratio_max: f64,

    // Thresholds
    pub exact_threshold: f64,
    pub exact_full_cap: f64,
    pub no_space_min_score: f64,

    /// Lower priority sorts first among equal scores.
    pub type_priority: HashMap<MatchType, i32>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_levenshtein_distance: 4,
            min_score: 1.0,
            w_missing: 0.6,
            w_fuzzy: 0.5,
            w_ratio: 1.0,
            w_extra_length: 0.15,
            bonus_max: 2.0,
            bonus_a_missing: 0.3,
            bonus_c_avgdist: 0.35,
            bonus_word_ratio_min: 0.4,
            bonus_extra_ratio_max: 1.0,
            exact_threshold: 10.0,
            exact_full_cap: 9.99,
            no_space_min_score: 7.0,
            type_priority: default_type_priority(),
        }
    }
}

impl ScoringConfig {
    /// Priority of a match type; unknown types fall back to `partial`.
    pub fn priority_of(&self, match_type: MatchType) -> i32 {
        self.type_priority
            .get(&match_type)
            .copied()
            .unwrap_or_else(|| {
                self.type_priority
                    .get(&MatchType::Partial)
                    .copied()
                    .unwrap_or(9)
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Apply geographic dispersion to ranked results.
    pub enabled: bool,
    /// Grid size in degrees.
    pub grid_size: f64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            grid_size: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Response-cache capacity in entries; 0 disables the cache.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

fn default_type_priority() -> HashMap<MatchType, i32> {
    HashMap::from([
        (MatchType::ExactFull, 0),
        (MatchType::ExactWithExtras, 1),
        (MatchType::NoSpaceMatch, 1),
        (MatchType::NearPerfect, 2),
        (MatchType::PhoneticStrict, 3),
        (MatchType::ExactWithMissing, 4),
        (MatchType::FuzzyFull, 5),
        (MatchType::Hybrid, 6),
        (MatchType::PhoneticTolerant, 7),
        (MatchType::FuzzyPartial, 8),
        (MatchType::Partial, 9),
    ])
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a file when it exists, otherwise start from defaults.
    /// Environment overrides apply either way.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            warn!("Config file {:?} not found, using defaults", path);
            let mut config = Config::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Environment overrides for the scalar keys; the tables stay
    /// file-configured.
    pub fn apply_env_overrides(&mut self) {
        override_from_env(
            "MAX_LEVENSHTEIN_DISTANCE",
            &mut self.scoring.max_levenshtein_distance,
        );
        override_from_env("MIN_SCORE", &mut self.scoring.min_score);
        override_from_env("W_MISSING", &mut self.scoring.w_missing);
        override_from_env("W_FUZZY", &mut self.scoring.w_fuzzy);
        override_from_env("W_RATIO", &mut self.scoring.w_ratio);
        override_from_env("W_EXTRA_LENGTH", &mut self.scoring.w_extra_length);
        override_from_env("BONUS_MAX", &mut self.scoring.bonus_max);
        override_from_env("BONUS_A_MISSING", &mut self.scoring.bonus_a_missing);
        override_from_env("BONUS_C_AVGDIST", &mut self.scoring.bonus_c_avgdist);
        override_from_env("BONUS_WORD_RATIO_MIN", &mut self.scoring.bonus_word_ratio_min);
        override_from_env(
            "BONUS_EXTRA_RATIO_MAX",
            &mut self.scoring.bonus_extra_ratio_max,
        );
        override_from_env("EXACT_THRESHOLD", &mut self.scoring.exact_threshold);
        override_from_env("EXACT_FULL_CAP", &mut self.scoring.exact_full_cap);
        override_from_env("NO_SPACE_MIN_SCORE", &mut self.scoring.no_space_min_score);
        override_from_env("SEARCH_BACKEND_URL", &mut self.backend.url);
        if let Ok(key) = std::env::var("SEARCH_BACKEND_API_KEY") {
            self.backend.api_key = Some(key);
        }
    }
}

fn override_from_env<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => warn!("Ignoring unparseable env override {}={}", key, raw),
        }
    }
}

/// Default synonym table for French restaurant queries. Every row reads
/// `canonical base -> surface variants`; the index flattens it at startup.
pub fn default_synonyms_fr() -> HashMap<String, Vec<String>> {
    let rows: &[(&str, &[&str])] = &[
        // Abbreviations common in establishment names
        ("saint", &["st", "st."]),
        ("sainte", &["ste", "ste."]),
        ("notre-dame", &["n.d.", "nd", "notre dame"]),
        ("mont", &["mt"]),
        ("grand", &["gr", "gd"]),
        ("petit", &["pt", "p'tit"]),
        // Establishment kinds
        ("restaurant", &["resto", "restau", "table", "établissement"]),
        ("brasserie", &["bistrot", "bistro", "taverne", "estaminet"]),
        ("café", &["bar", "buvette", "salon de thé", "comptoir"]),
        ("auberge", &["hostellerie", "relais"]),
        ("crêperie", &["creperie", "galetterie"]),
        ("sandwicherie", &["snack", "sandwich"]),
        ("pizzeria", &["pizza", "italien"]),
        ("boulangerie", &["boulanger", "pain", "patisserie"]),
        // Cuisines
        ("chinois", &["asiatique", "oriental", "chine"]),
        ("japonais", &["sushi", "japon", "nippon", "ramen", "yakitori"]),
        ("indien", &["curry", "inde", "tandoor", "bollywood"]),
        ("italien", &["italie", "pasta", "pizzeria"]),
        ("français", &["traditionnel", "classique", "terroir", "hexagonal"]),
        ("américain", &["burger", "hamburger", "fast-food", "usa"]),
        ("mexicain", &["tex-mex", "mexique", "tacos"]),
        ("libanais", &["oriental", "liban", "mezze"]),
        ("grec", &["grèce", "hellénique", "souvlaki"]),
        ("turc", &["turquie", "kebab", "döner"]),
        ("thaï", &["thaïlande", "thai", "pad-thai"]),
        ("vietnamien", &["vietnam", "pho", "nem"]),
        ("marocain", &["maroc", "maghrébin", "tajine", "couscous"]),
        // Regional cuisines
        ("alsacien", &["alsace", "choucroute", "bretzel"]),
        ("breton", &["bretagne", "crêpe", "galette", "cidre"]),
        ("provençal", &["provence", "méditerranéen", "bouillabaisse"]),
        ("lyonnais", &["lyon", "bouchon", "quenelle"]),
        ("normand", &["normandie", "calvados", "camembert"]),
        ("savoyard", &["savoie", "fondue", "raclette", "tartiflette"]),
        ("auvergnat", &["auvergne", "truffade", "cantal"]),
        ("gascon", &["gascogne", "cassoulet", "confit"]),
        // Chains
        (
            "mcdonalds",
            &[
                "mcdonald's",
                "mcdo",
                "macdo",
                "ronald",
                "mcdonald",
                "macdonalds",
                "macdonald's",
                "macdonald",
            ],
        ),
        ("kfc", &["kentucky", "poulet frit"]),
        ("quick", &["burger king"]),
        ("subway", &["sub", "sandwich"]),
        // Services
        ("livraison", &["delivery", "à domicile", "emporter", "takeaway"]),
        ("terrasse", &["extérieur", "dehors", "jardin", "patio"]),
        ("climatisé", &["clim", "air conditionné"]),
        ("parking", &["stationnement", "garage"]),
        ("wifi", &["internet", "connexion"]),
        // Ambiance
        ("romantique", &["amoureux", "intime", "cosy"]),
        ("familial", &["famille", "enfants", "kids"]),
        ("branché", &["tendance", "mode", "hip"]),
        ("traditionnel", &["authentique", "ancien", "classique"]),
        ("moderne", &["contemporain", "design"]),
        // Price
        ("pas cher", &["économique", "abordable", "bon marché"]),
        ("cher", &["luxe", "haut de gamme", "gastronomique"]),
        ("menu", &["formule", "plat du jour"]),
        // Hours
        ("ouvert", &["open"]),
        ("fermé", &["closed"]),
        ("midi", &["déjeuner", "lunch"]),
        ("soir", &["dîner", "dinner"]),
        // Landmarks
        ("centre-ville", &["centre", "hypercentre", "coeur de ville"]),
        ("gare", &["station", "terminus"]),
        ("aéroport", &["airport", "terminal"]),
        ("université", &["fac", "campus", "étudiants"]),
        ("hôpital", &["clinique", "médical"]),
        ("zone commerciale", &["centre commercial", "galerie marchande"]),
        // Famous establishments
        ("ritz", &["le ritz", "hotel ritz", "palace ritz"]),
        ("plaza", &["le plaza", "plaza athénée"]),
        ("bristol", &["le bristol", "hotel bristol"]),
        ("george v", &["george 5", "four seasons george v"]),
        ("crillon", &["le crillon", "hotel de crillon"]),
        ("meurice", &["le meurice", "hotel meurice"]),
        ("shangri-la", &["shangri la", "hotel shangri-la"]),
        ("café de la paix", &["de la paix", "peace café"]),
        ("fouquet's", &["fouquets", "le fouquet's"]),
        ("angelina", &["salon angelina", "thé angelina"]),
        ("ladurée", &["laduree", "salon ladurée"]),
        ("berthillon", &["glacier berthillon", "ile saint louis"]),
        // Markets
        (
            "marché des enfants rouges",
            &["enfants rouges", "marché enfants rouges"],
        ),
        (
            "marché saint germain",
            &["st germain marché", "marché st germain"],
        ),
        ("marché aux puces", &["puces", "puces de saint-ouen"]),
        ("marché couvert", &["halles", "marché des halles"]),
        // Modes
        ("drive", &["drive-in", "au volant", "sans descendre"]),
        (
            "click and collect",
            &["click & collect", "retrait magasin", "à récupérer"],
        ),
        ("brunch", &["petit-déjeuner tardif", "breakfast"]),
        ("afterwork", &["after-work", "après travail", "5 à 7"]),
        ("happy hour", &["heure heureuse", "prix réduits"]),
        // Diets
        ("végétarien", &["végé", "veggie", "sans viande"]),
        ("végan", &["vegan", "végétalien", "plant-based"]),
        ("sans gluten", &["gluten-free", "intolérant gluten", "coeliaque"]),
        ("halal", &["musulman", "certifié halal"]),
        ("casher", &["kasher", "cacher", "juif", "rabbinique"]),
    ];

    rows.iter()
        .map(|(base, variants)| {
            (
                base.to_string(),
                variants.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect()
}
