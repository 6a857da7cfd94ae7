use std::ops::RangeInclusive;
use std::sync::Arc;

use thiserror::Error;
use twenty_bot::{EngineParams, Policy, PolicyKind};
use twenty_core::belief::LikelihoodConfig;
use twenty_core::model::knowledge::KnowledgeBase;

use crate::config::AgentConfig;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid parameter '{key}' for agent '{name}': {message}")]
    InvalidParam {
        name: String,
        key: String,
        message: String,
    },
    #[error("agent '{name}' of kind {kind} takes no parameters (got '{key}')")]
    UnexpectedParam {
        name: String,
        kind: &'static str,
        key: String,
    },
}

/// Validated recipe for spawning one agent's policy per trial.
#[derive(Debug, Clone)]
pub(super) struct AgentBlueprint {
    pub(super) name: String,
    pub(super) kind: PolicyKind,
    params: EngineParams,
}

impl AgentBlueprint {
    pub(super) fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, AgentError> {
        configs.iter().map(Self::from_config).collect()
    }

    fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let params = match config.kind {
            PolicyKind::Bayesian => engine_params(&config.name, &config.params)?,
            PolicyKind::Random => {
                reject_params(&config.name, config.kind, &config.params)?;
                EngineParams::default()
            }
        };

        Ok(Self {
            name: config.name.clone(),
            kind: config.kind,
            params,
        })
    }

    pub(super) fn spawn_policy(&self, kb: Arc<KnowledgeBase>, seed: u64) -> Box<dyn Policy> {
        self.kind.spawn(kb, self.params, seed)
    }
}

/// Engine knobs from a `params` mapping; missing keys keep their defaults.
fn engine_params(name: &str, params: &serde_yaml::Value) -> Result<EngineParams, AgentError> {
    let mut engine = EngineParams::default();
    let Some(mapping) = params.as_mapping() else {
        if params.is_null() {
            return Ok(engine);
        }
        return Err(invalid(name, "params", "expected mapping for bayesian params"));
    };

    for (key, value) in mapping {
        let key = key.as_str().unwrap_or_default();
        match key {
            "shortlist_min" => {
                engine.shortlist_min = value
                    .as_u64()
                    .filter(|min| *min >= 1)
                    .and_then(|min| usize::try_from(min).ok())
                    .ok_or_else(|| invalid(name, key, "must be a positive integer"))?;
            }
            "shortlist_margin" => {
                engine.shortlist_margin = unit_interval(name, key, value)?;
            }
            "gain_threshold" => {
                engine.gain_threshold = value
                    .as_f64()
                    .filter(|gain| gain.is_finite() && *gain >= 0.0)
                    .ok_or_else(|| invalid(name, key, "must be a non-negative number"))?;
            }
            "collapse_mass" => {
                engine.collapse_mass =
                    within(name, key, value, &EngineParams::COLLAPSE_MASS_RANGE)?;
            }
            "likelihood_match" => {
                engine.likelihood.match_weight =
                    within(name, key, value, &LikelihoodConfig::MATCH_RANGE)?;
            }
            "likelihood_mismatch" => {
                engine.likelihood.mismatch_weight =
                    within(name, key, value, &LikelihoodConfig::MISMATCH_RANGE)?;
            }
            other => return Err(invalid(name, other, "unknown parameter")),
        }
    }

    if engine.likelihood.match_weight <= engine.likelihood.mismatch_weight {
        return Err(invalid(
            name,
            "likelihood_match",
            "must be greater than likelihood_mismatch",
        ));
    }

    Ok(engine)
}

fn reject_params(
    name: &str,
    kind: PolicyKind,
    params: &serde_yaml::Value,
) -> Result<(), AgentError> {
    let first_key = params
        .as_mapping()
        .and_then(|mapping| mapping.keys().next())
        .map(|key| key.as_str().unwrap_or("<non-string>").to_string());
    match first_key {
        Some(key) => Err(AgentError::UnexpectedParam {
            name: name.to_string(),
            kind: kind.as_str(),
            key,
        }),
        None => Ok(()),
    }
}

fn unit_interval(name: &str, key: &str, value: &serde_yaml::Value) -> Result<f64, AgentError> {
    within(name, key, value, &(0.0..=1.0))
}

fn within(
    name: &str,
    key: &str,
    value: &serde_yaml::Value,
    range: &RangeInclusive<f64>,
) -> Result<f64, AgentError> {
    value
        .as_f64()
        .filter(|p| p.is_finite() && range.contains(p))
        .ok_or_else(|| {
            let message = format!("must be a number in [{}, {}]", range.start(), range.end());
            invalid(name, key, &message)
        })
}

fn invalid(name: &str, key: &str, message: &str) -> AgentError {
    AgentError::InvalidParam {
        name: name.to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}
