//! Seeder settings.
//!
//! Layers, lowest priority first: built-in defaults, a TOML file, then
//! `SEEDER_*` environment variables and command-line flags (clap reads
//! both, flags winning).

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use refcatalog_datasets::LoadMode;
use serde::Deserialize;

use crate::SeedError;
use crate::batch::DEFAULT_BATCH_SIZE;
use crate::phase::{Phase, parse_phase_names};

pub const DEFAULT_TOP_N: usize = 20_000;
pub const DEFAULT_MAX_EXAMPLES_PER_WORD: usize = 5;
pub const DEFAULT_STORE_PATH: &str = "catalog.json";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeederConfig {
    pub wiktionary_path: Option<PathBuf>,
    pub ngsl_path: Option<PathBuf>,
    pub nawl_path: Option<PathBuf>,
    pub cmu_path: Option<PathBuf>,
    pub wordnet_path: Option<PathBuf>,
    pub tatoeba_path: Option<PathBuf>,
    /// Target vocabulary size for the Wiktionary selection.
    pub top_n: usize,
    /// Rows per repository round-trip; 0 means the default.
    pub batch_size: usize,
    pub max_examples_per_word: usize,
    pub dry_run: bool,
    pub load_mode: LoadMode,
}

impl Default for SeederConfig {
    fn default() -> Self {
        SeederConfig {
            wiktionary_path: None,
            ngsl_path: None,
            nawl_path: None,
            cmu_path: None,
            wordnet_path: None,
            tatoeba_path: None,
            top_n: DEFAULT_TOP_N,
            batch_size: DEFAULT_BATCH_SIZE,
            max_examples_per_word: DEFAULT_MAX_EXAMPLES_PER_WORD,
            dry_run: false,
            load_mode: LoadMode::Mmap,
        }
    }
}

impl SeederConfig {
    /// Read a TOML file on top of the defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, SeedError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| SeedError::Config(format!("read {}: {e}", path.display())))?;
        let cfg: SeederConfig = toml::from_str(&raw)
            .map_err(|e| SeedError::Config(format!("parse {}: {e}", path.display())))?;
        Ok(cfg.normalized())
    }

    pub fn normalized(mut self) -> Self {
        if self.batch_size == 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        self
    }
}

#[derive(Debug, Parser)]
#[command(name = "refcatalog-seed")]
#[command(about = "Seed the reference word catalog from open lexical datasets")]
pub struct Cli {
    /// TOML file with seeder settings.
    #[arg(long, env = "SEEDER_CONFIG")]
    pub config: Option<PathBuf>,
    /// Catalog snapshot to load and write back.
    #[arg(long, env = "SEEDER_STORE", default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,
    /// Comma-separated phases to run (default: all).
    #[arg(long, env = "SEEDER_PHASES", value_delimiter = ',')]
    pub phase: Vec<String>,
    /// Parse datasets without writing to the catalog.
    #[arg(long, env = "SEEDER_DRY_RUN")]
    pub dry_run: bool,

    #[arg(long, env = "SEEDER_WIKTIONARY_PATH")]
    pub wiktionary_path: Option<PathBuf>,
    #[arg(long, env = "SEEDER_NGSL_PATH")]
    pub ngsl_path: Option<PathBuf>,
    #[arg(long, env = "SEEDER_NAWL_PATH")]
    pub nawl_path: Option<PathBuf>,
    #[arg(long, env = "SEEDER_CMU_PATH")]
    pub cmu_path: Option<PathBuf>,
    #[arg(long, env = "SEEDER_WORDNET_PATH")]
    pub wordnet_path: Option<PathBuf>,
    #[arg(long, env = "SEEDER_TATOEBA_PATH")]
    pub tatoeba_path: Option<PathBuf>,
    #[arg(long, env = "SEEDER_TOP_N")]
    pub top_n: Option<usize>,
    #[arg(long, env = "SEEDER_BATCH_SIZE")]
    pub batch_size: Option<usize>,
    #[arg(long, env = "SEEDER_MAX_EXAMPLES")]
    pub max_examples_per_word: Option<usize>,
    /// `mmap` or `owned`.
    #[arg(long, env = "SEEDER_LOAD_MODE")]
    pub load_mode: Option<LoadMode>,
}

impl Cli {
    /// Resolve the effective configuration and phase filter.
    pub fn resolve(&self) -> Result<(SeederConfig, Vec<Phase>), SeedError> {
        let base = match &self.config {
            Some(path) => SeederConfig::from_toml_file(path)?,
            None => SeederConfig::default(),
        };
        let phases = parse_phase_names(&self.phase).map_err(|e| SeedError::Config(e.to_string()))?;
        Ok((self.apply(base), phases))
    }

    fn apply(&self, mut cfg: SeederConfig) -> SeederConfig {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        fn set_path(slot: &mut Option<PathBuf>, value: &Option<PathBuf>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        set_path(&mut cfg.wiktionary_path, &self.wiktionary_path);
        set_path(&mut cfg.ngsl_path, &self.ngsl_path);
        set_path(&mut cfg.nawl_path, &self.nawl_path);
        set_path(&mut cfg.cmu_path, &self.cmu_path);
        set_path(&mut cfg.wordnet_path, &self.wordnet_path);
        set_path(&mut cfg.tatoeba_path, &self.tatoeba_path);
        set(&mut cfg.top_n, &self.top_n);
        set(&mut cfg.batch_size, &self.batch_size);
        set(&mut cfg.max_examples_per_word, &self.max_examples_per_word);
        set(&mut cfg.load_mode, &self.load_mode);
        cfg.dry_run |= self.dry_run;
        cfg.normalized()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("refcatalog-seed").chain(args.iter().copied()))
            .expect("valid args")
    }

    #[test]
    fn defaults_apply_without_file() {
        let (cfg, phases) = cli(&[]).resolve().unwrap();
        assert_eq!(cfg, SeederConfig::default());
        assert!(phases.is_empty());
    }

    #[test]
    fn toml_then_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "cmu_path = \"/data/cmudict.txt\"\ntop_n = 100\nbatch_size = 0\nload_mode = \"owned\""
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let (cfg, _) = cli(&["--config", path, "--top-n", "42"]).resolve().unwrap();
        assert_eq!(cfg.cmu_path, Some(PathBuf::from("/data/cmudict.txt")));
        assert_eq!(cfg.top_n, 42);
        assert_eq!(cfg.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(cfg.load_mode, LoadMode::Owned);
        assert_eq!(cfg.max_examples_per_word, DEFAULT_MAX_EXAMPLES_PER_WORD);
    }

    #[test]
    fn unknown_toml_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "top_nn = 5").unwrap();
        let err = SeederConfig::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(err, SeedError::Config(_)));
    }

    #[test]
    fn phase_list_is_validated() {
        let (_, phases) = cli(&["--phase", "tatoeba,ngsl"]).resolve().unwrap();
        assert_eq!(phases, vec![Phase::Tatoeba, Phase::Ngsl]);
        let err = cli(&["--phase", "ngsl,bogus"]).resolve().unwrap_err();
        assert!(matches!(err, SeedError::Config(msg) if msg.contains("bogus")));
    }

    #[test]
    fn dry_run_flag_wins() {
        let (cfg, _) = cli(&["--dry-run"]).resolve().unwrap();
        assert!(cfg.dry_run);
    }
}
