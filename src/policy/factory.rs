use anyhow::{Context, Result};
use log::info;

use super::config::PolicyConfig;
use super::evaluator::PolicyEvaluator;

pub struct PolicyFactory;

impl PolicyFactory {
    pub fn new() -> Self {
        Self
    }

    /// Builds the decision engine from configuration. Any invalid rule fails
    /// the whole build so the engine never starts on a partial rule set.
    pub fn build_evaluator(&self, cfg: &PolicyConfig) -> Result<PolicyEvaluator> {
        let mut rules = Vec::with_capacity(cfg.rules.len());
        for (idx, rule) in cfg.rules.iter().enumerate() {
            let rule = rule
                .build_rule()
                .with_context(|| format!("build rule {idx}"))?;
            rules.push(rule);
        }

        info!("Loaded {} authorization rules", rules.len());
        Ok(PolicyEvaluator::new(rules))
    }
}
