use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};
use crate::types::request::RequestType;

use super::rule::{PathPattern, PolicyRule, RuleCondition};

/// Policy rule set configuration.
///
/// The rule set is loaded once at startup and read-only afterwards. Any
/// invalid rule fails the whole load; partial rule sets are never accepted.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PolicyConfig {
    /// Authorization rules, evaluated in order. Order does not change the
    /// decision; the combination of rule outcomes is commutative.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// One configured authorization rule.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RuleConfig {
    /// Path pattern the rule applies to. `*` matches one segment, a trailing
    /// `**` matches any remainder.
    pub path: String,

    /// Request methods the rule applies to: "create", "read", "update",
    /// "delete", or "*" for all of them.
    pub methods: Vec<String>,

    /// Roles that satisfy the rule. Mutually exclusive with `owner_field`.
    /// A rule with neither roles nor owner_field applies unconditionally.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    /// Request attribute whose value must equal the caller's subject.
    /// Mutually exclusive with `roles`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_field: Option<String>,
}

impl CommonConfig for PolicyConfig {
    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        for (idx, rule) in self.rules.iter().enumerate() {
            rule.validate().with_context(|| format!("rule {idx}"))?;
        }
        Ok(())
    }
}

impl RuleConfig {
    fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            bail!("path is required");
        }
        self.path.parse::<PathPattern>().context("parse path")?;

        if self.methods.is_empty() {
            bail!("methods is required");
        }
        for method in &self.methods {
            if method != "*" {
                method
                    .parse::<RequestType>()
                    .with_context(|| format!("method '{method}'"))?;
            }
        }

        if !self.roles.is_empty() && self.owner_field.is_some() {
            bail!("roles and owner_field are mutually exclusive");
        }
        if matches!(self.owner_field, Some(ref field) if field.is_empty()) {
            bail!("owner_field cannot be empty");
        }

        Ok(())
    }

    pub(super) fn build_rule(&self) -> Result<PolicyRule> {
        self.validate()?;

        let path = self.path.parse::<PathPattern>().context("parse path")?;

        let mut types = HashSet::new();
        for method in &self.methods {
            if method == "*" {
                types.extend(RequestType::ALL);
            } else {
                types.insert(method.parse::<RequestType>()?);
            }
        }

        let condition = if let Some(ref field) = self.owner_field {
            RuleCondition::OwnerMatch(field.clone())
        } else if !self.roles.is_empty() {
            RuleCondition::RoleIn(self.roles.iter().cloned().collect())
        } else {
            RuleCondition::Unconditional
        };

        Ok(PolicyRule::new(path, types, condition))
    }
}
