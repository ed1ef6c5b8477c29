use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::scoring::{ScoringConfig, ScoringWeights};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Enables the Postgres snapshot sink when set.
    pub database_url: Option<String>,
    pub board_fixtures_dir: PathBuf,
    /// Webhook notifier target. The log notifier is used when unset.
    pub notify_webhook_url: Option<String>,
    pub scoring: ScoringConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut scoring = ScoringConfig::default();
        if let Some(raw) = optional_env("SCORING_WEIGHTS") {
            scoring.weights = parse_weights(&raw).context("SCORING_WEIGHTS is invalid")?;
        }
        if let Some(raw) = optional_env("BOARD_WEIGHTS") {
            scoring.board_weights =
                parse_board_weights(&raw).context("BOARD_WEIGHTS is invalid")?;
        }
        if let Some(raw) = optional_env("SHALLOW_KEYWORD_MULTIPLIER") {
            let multiplier = raw
                .trim()
                .parse::<f64>()
                .context("SHALLOW_KEYWORD_MULTIPLIER must be a number")?;
            scoring.shallow_multiplier = check_weight(multiplier)
                .context("SHALLOW_KEYWORD_MULTIPLIER is invalid")?;
        }

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: optional_env("DATABASE_URL"),
            board_fixtures_dir: optional_env("BOARD_FIXTURES_DIR")
                .unwrap_or_else(|| "./fixtures/boards".to_string())
                .into(),
            notify_webhook_url: optional_env("NOTIFY_WEBHOOK_URL"),
            scoring,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `"keyword,experience,board"`, e.g. `"0.5,0.3,0.2"`.
fn parse_weights(raw: &str) -> Result<ScoringWeights> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .context("weights must be numbers")?;
    let &[keyword, experience, board] = parts.as_slice() else {
        bail!("expected three comma-separated weights, got {}", parts.len());
    };
    Ok(ScoringWeights {
        keyword: check_weight(keyword)?,
        experience: check_weight(experience)?,
        board: check_weight(board)?,
    })
}

/// `"board=weight,board=weight"`. Board ids are lowercased.
fn parse_board_weights(raw: &str) -> Result<BTreeMap<String, f64>> {
    raw.split(',')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| -> Result<(String, f64)> {
            let (board, weight) = pair
                .split_once('=')
                .with_context(|| format!("'{pair}' is not of the form board=weight"))?;
            let weight = weight
                .trim()
                .parse::<f64>()
                .with_context(|| format!("weight for '{}' is not a number", board.trim()))?;
            let weight = check_weight(weight)
                .with_context(|| format!("weight for '{}' is invalid", board.trim()))?;
            Ok((board.trim().to_lowercase(), weight))
        })
        .collect()
}

/// Weights must be finite and ≥ 0.
fn check_weight(weight: f64) -> Result<f64> {
    if !weight.is_finite() || weight < 0.0 {
        bail!("{weight} is not a finite, non-negative number");
    }
    Ok(weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weights() {
        let w = parse_weights(" 0.6, 0.3 ,0.1").unwrap();
        assert_eq!(
            w,
            ScoringWeights {
                keyword: 0.6,
                experience: 0.3,
                board: 0.1
            }
        );
        assert!(parse_weights("0.5,0.5").is_err());
        assert!(parse_weights("a,b,c").is_err());
        assert!(parse_weights("0.5,-0.3,0.2").is_err());
        assert!(parse_weights("NaN,0.3,0.2").is_err());
        assert!(parse_weights("0.5,inf,0.2").is_err());
    }

    #[test]
    fn test_parse_board_weights() {
        let weights = parse_board_weights("Remotive=1.5, duunitori = 0.5,").unwrap();
        assert_eq!(weights.get("remotive"), Some(&1.5));
        assert_eq!(weights.get("duunitori"), Some(&0.5));
        assert!(parse_board_weights("remotive").is_err());
        assert!(parse_board_weights("remotive=high").is_err());
        assert!(parse_board_weights("remotive=-1").is_err());
        assert!(parse_board_weights("remotive=NaN").is_err());
    }

    #[test]
    fn test_check_weight() {
        assert_eq!(check_weight(0.0).unwrap(), 0.0);
        assert_eq!(check_weight(0.5).unwrap(), 0.5);
        assert!(check_weight(-0.1).is_err());
        assert!(check_weight(f64::NAN).is_err());
        assert!(check_weight(f64::INFINITY).is_err());
    }
}
