//! Configuration for the game service
//!
//! All settings are gathered once at startup into a [`GameConfig`] which is
//! handed to the orchestrator and clients explicitly.
//!
//! Priority, highest first: command-line flag, environment variable (via
//! clap `env`), TOML config file, compiled default.

use clap::Parser;
use gc_common::config::{
    load_toml_or_default, resolve_folder, CompiledDefaults, ConfigSource, LoggingConfig,
};
use gc_common::{Error, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::round::{PromptStyle, RoundSettings};
use crate::services::answer_scorer::{DEFAULT_SCORING_ENDPOINT, DEFAULT_SCORING_MODEL};
use crate::services::image_synthesizer::{DEFAULT_SYNTHESIS_ENDPOINT, DEFAULT_SYNTHESIS_MODEL};

pub const DEFAULT_PORT: u16 = 5780;

/// Command-line arguments for gc-game
#[derive(Parser, Debug, Default)]
#[command(name = "gc-game")]
#[command(about = "Guesscasso round service: word pairs, noisy image ladders and guess scoring")]
#[command(version)]
pub struct Args {
    /// Path to a TOML config file (defaults to the platform config dir)
    #[arg(short, long, env = "GC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "GC_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "GC_BIND_ADDRESS")]
    pub bind_address: Option<IpAddr>,

    /// Folder holding one word list file per category
    #[arg(short, long, env = "GC_WORDS_FOLDER")]
    pub words_folder: Option<PathBuf>,

    /// Frames per noise ladder
    #[arg(long, env = "GC_RUNG_COUNT")]
    pub rung_count: Option<usize>,

    /// Per-step noise bound in 8-bit channel units
    #[arg(long, env = "GC_NOISE_INTENSITY")]
    pub noise_intensity: Option<f32>,

    /// Fixed synthesis seed (random per round when omitted)
    #[arg(long, env = "GC_SEED")]
    pub seed: Option<u32>,

    /// Hugging Face API token for image synthesis
    #[arg(long, env = "HUGGINGFACE_API_KEY", hide_env_values = true)]
    pub huggingface_api_key: Option<String>,

    /// API key for the scoring endpoint
    #[arg(long, env = "GC_SCORER_API_KEY", hide_env_values = true)]
    pub scorer_api_key: Option<String>,
}

/// `[round]` section of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoundToml {
    pub rung_count: Option<usize>,
    pub noise_intensity: Option<f32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub inference_steps: Option<u32>,
    pub guidance_scale: Option<f32>,
    pub seed: Option<u32>,
    pub prompt_style: Option<PromptStyle>,
    pub placeholder_color: Option<[u8; 3]>,
}

/// `[image_synthesis]` / `[scoring]` sections of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteServiceToml {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; missing values fall back to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameToml {
    pub port: Option<u16>,
    pub bind_address: Option<IpAddr>,
    pub words_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub round: RoundToml,
    #[serde(default)]
    pub image_synthesis: RemoteServiceToml,
    #[serde(default)]
    pub scoring: RemoteServiceToml,
}

/// Connection details for one remote collaborator
#[derive(Debug, Clone)]
pub struct RemoteServiceConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub listen_addr: SocketAddr,
    pub words_folder: PathBuf,
    pub log_level: String,
    pub round: RoundSettings,
    pub image_synthesis: RemoteServiceConfig,
    pub scoring: RemoteServiceConfig,
}

impl GameConfig {
    /// Load the TOML file named by `args` (or the platform default) and merge
    ///
    /// The returned [`ConfigSource`] should be logged once tracing is up.
    pub fn load(args: &Args) -> Result<(Self, ConfigSource)> {
        let (toml, source): (GameToml, ConfigSource) =
            load_toml_or_default(args.config.as_deref())?;
        Ok((Self::resolve(args, toml)?, source))
    }

    /// Merge CLI/ENV values over TOML values over compiled defaults
    pub fn resolve(args: &Args, toml: GameToml) -> Result<Self> {
        let defaults = CompiledDefaults::for_current_platform();
        let round_defaults = RoundSettings::default();

        let words_folder = resolve_folder(
            args.words_folder.as_deref(),
            "GC_WORDS_FOLDER",
            toml.words_folder.as_deref(),
            defaults.words_folder,
        );

        let port = args.port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let bind_address = args
            .bind_address
            .or(toml.bind_address)
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

        let r = &toml.round;
        let round = RoundSettings {
            rung_count: args
                .rung_count
                .or(r.rung_count)
                .unwrap_or(round_defaults.rung_count),
            noise_intensity: args
                .noise_intensity
                .or(r.noise_intensity)
                .unwrap_or(round_defaults.noise_intensity),
            width: r.width.unwrap_or(round_defaults.width),
            height: r.height.unwrap_or(round_defaults.height),
            inference_steps: r.inference_steps.unwrap_or(round_defaults.inference_steps),
            guidance_scale: r.guidance_scale.unwrap_or(round_defaults.guidance_scale),
            seed: args.seed.or(r.seed),
            prompt_style: r.prompt_style.unwrap_or(round_defaults.prompt_style),
            placeholder_color: r.placeholder_color.unwrap_or(round_defaults.placeholder_color),
            synthesis_timeout: toml
                .image_synthesis
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(round_defaults.synthesis_timeout),
            scoring_timeout: toml
                .scoring
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(round_defaults.scoring_timeout),
        };
        validate_round(&round)?;

        let image_synthesis = RemoteServiceConfig {
            endpoint: toml
                .image_synthesis
                .endpoint
                .unwrap_or_else(|| DEFAULT_SYNTHESIS_ENDPOINT.to_string()),
            model: toml
                .image_synthesis
                .model
                .unwrap_or_else(|| DEFAULT_SYNTHESIS_MODEL.to_string()),
            api_key: non_blank(args.huggingface_api_key.clone())
                .or_else(|| non_blank(toml.image_synthesis.api_key)),
        };

        let scoring = RemoteServiceConfig {
            endpoint: toml
                .scoring
                .endpoint
                .unwrap_or_else(|| DEFAULT_SCORING_ENDPOINT.to_string()),
            model: toml
                .scoring
                .model
                .unwrap_or_else(|| DEFAULT_SCORING_MODEL.to_string()),
            api_key: non_blank(args.scorer_api_key.clone())
                .or_else(|| non_blank(toml.scoring.api_key)),
        };

        Ok(Self {
            listen_addr: SocketAddr::new(bind_address, port),
            words_folder,
            log_level: toml.logging.level,
            round,
            image_synthesis,
            scoring,
        })
    }
}

fn validate_round(round: &RoundSettings) -> Result<()> {
    if round.rung_count == 0 {
        return Err(Error::Config("rung_count must be at least 1".to_string()));
    }
    if !round.noise_intensity.is_finite() || round.noise_intensity < 0.0 {
        return Err(Error::Config(format!(
            "noise_intensity must be finite and >= 0, got {}",
            round.noise_intensity
        )));
    }
    if round.synthesis_timeout.is_zero() || round.scoring_timeout.is_zero() {
        return Err(Error::Config(
            "timeout_secs must be at least 1 for image_synthesis and scoring".to_string(),
        ));
    }
    if round.width == 0 || round.height == 0 {
        return Err(Error::Config(format!(
            "image dimensions must be non-zero, got {}x{}",
            round.width, round.height
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let args = Args {
            words_folder: Some(PathBuf::from("/tmp/words")),
            ..Args::default()
        };
        let config = GameConfig::resolve(&args, GameToml::default()).unwrap();

        assert_eq!(config.listen_addr.port(), DEFAULT_PORT);
        assert_eq!(config.words_folder, PathBuf::from("/tmp/words"));
        assert_eq!(config.round.rung_count, 10);
        assert_eq!(config.round.width, 512);
        assert_eq!(config.round.placeholder_color, [0, 0, 255]);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.image_synthesis.model, DEFAULT_SYNTHESIS_MODEL);
        assert!(config.round.seed.is_none());
    }

    #[test]
    fn test_cli_overrides_toml() {
        let toml: GameToml = toml::from_str(
            r#"
            port = 6000
            words_folder = "/srv/words"

            [round]
            rung_count = 6
            noise_intensity = 12.5
            prompt_style = "hybrid"

            [scoring]
            api_key = "from-toml"
            timeout_secs = 5
            "#,
        )
        .unwrap();

        let args = Args {
            port: Some(7000),
            words_folder: Some(PathBuf::from("/cli/words")),
            rung_count: Some(8),
            scorer_api_key: Some("from-cli".to_string()),
            ..Args::default()
        };
        let config = GameConfig::resolve(&args, toml).unwrap();

        assert_eq!(config.listen_addr.port(), 7000);
        assert_eq!(config.words_folder, PathBuf::from("/cli/words"));
        assert_eq!(config.round.rung_count, 8);
        assert_eq!(config.round.noise_intensity, 12.5);
        assert_eq!(config.round.prompt_style, PromptStyle::Hybrid);
        assert_eq!(config.round.scoring_timeout, Duration::from_secs(5));
        assert_eq!(config.scoring.api_key.as_deref(), Some("from-cli"));
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let args = Args {
            words_folder: Some(PathBuf::from("/tmp/words")),
            huggingface_api_key: Some("   ".to_string()),
            ..Args::default()
        };
        let config = GameConfig::resolve(&args, GameToml::default()).unwrap();
        assert!(config.image_synthesis.api_key.is_none());
    }

    #[test]
    fn test_invalid_round_settings_rejected() {
        let args = Args {
            words_folder: Some(PathBuf::from("/tmp/words")),
            rung_count: Some(0),
            ..Args::default()
        };
        let err = GameConfig::resolve(&args, GameToml::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let args = Args {
            words_folder: Some(PathBuf::from("/tmp/words")),
            noise_intensity: Some(-3.0),
            ..Args::default()
        };
        assert!(GameConfig::resolve(&args, GameToml::default()).is_err());

        let args = Args {
            words_folder: Some(PathBuf::from("/tmp/words")),
            ..Args::default()
        };
        for section in ["scoring", "image_synthesis"] {
            let toml: GameToml =
                toml::from_str(&format!("[{section}]\ntimeout_secs = 0")).unwrap();
            let err = GameConfig::resolve(&args, toml).unwrap_err();
            assert!(matches!(err, Error::Config(ref msg) if msg.contains("timeout_secs")));
        }
    }

    #[test]
    fn test_load_explicit_file_reports_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gc.toml");
        std::fs::write(&path, "port = 6200\n[logging]\nlevel = \"debug\"\n").unwrap();

        let args = Args {
            config: Some(path.clone()),
            words_folder: Some(PathBuf::from("/tmp/words")),
            ..Args::default()
        };
        let (config, source) = GameConfig::load(&args).unwrap();
        assert_eq!(config.listen_addr.port(), 6200);
        assert_eq!(config.log_level, "debug");
        assert_eq!(source, ConfigSource::File(path));
    }

    #[test]
    fn test_args_parse_flags() {
        let args = Args::parse_from([
            "gc-game",
            "--port",
            "6100",
            "--words-folder",
            "/data/words",
            "--rung-count",
            "12",
        ]);
        assert_eq!(args.port, Some(6100));
        assert_eq!(args.words_folder, Some(PathBuf::from("/data/words")));
        assert_eq!(args.rung_count, Some(12));
    }
}
