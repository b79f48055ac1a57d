use std::collections::HashSet;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::types::request::{RequestContext, RequestType, ResourcePath};
use crate::types::state::ResourceState;

use super::{AuthzDecision, OWNER_QUERY_PARAM};

/// A pattern over path segments.
///
/// `*` matches exactly one segment; a trailing `**` matches any remainder,
/// including none. Everything else matches literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<PatternSegment>,
    rest: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Literal(String),
    Any,
}

#[derive(Error, Debug)]
pub enum ParsePatternError {
    #[error("path pattern must start with '/'")]
    NotAbsolute,

    #[error("path pattern has an empty segment")]
    EmptySegment,

    #[error("'**' is only allowed as the last segment")]
    RestNotLast,
}

impl FromStr for PathPattern {
    type Err = ParsePatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(raw) = s.strip_prefix('/') else {
            return Err(ParsePatternError::NotAbsolute);
        };

        let mut segments = Vec::new();
        let mut rest = false;
        if raw.is_empty() {
            // The pattern "/" matches the root path only
            return Ok(Self { segments, rest });
        }

        let parts: Vec<&str> = raw.split('/').collect();
        for (idx, part) in parts.iter().enumerate() {
            match *part {
                "" => return Err(ParsePatternError::EmptySegment),
                "**" => {
                    if idx != parts.len() - 1 {
                        return Err(ParsePatternError::RestNotLast);
                    }
                    rest = true;
                }
                "*" => segments.push(PatternSegment::Any),
                literal => segments.push(PatternSegment::Literal(literal.to_string())),
            }
        }

        Ok(Self { segments, rest })
    }
}

impl PathPattern {
    pub fn matches(&self, path: &ResourcePath) -> bool {
        let segments = path.segments();
        if segments.len() < self.segments.len() {
            return false;
        }
        if !self.rest && segments.len() != self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(segments)
            .all(|(pattern, segment)| match pattern {
                PatternSegment::Literal(literal) => literal == segment,
                PatternSegment::Any => true,
            })
    }
}

/// The condition a matched rule applies to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleCondition {
    /// Satisfied by every caller, anonymous included
    Unconditional,

    /// Satisfied when the caller holds at least one of the given roles
    RoleIn(HashSet<String>),

    /// Satisfied when the request's owner attribute equals the caller's
    /// subject. The attribute is read from the target state first, then from
    /// the JSON query blob.
    OwnerMatch(String),
}

/// A single authorization rule: a path pattern, the request types it applies
/// to, and a condition.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    pub path: PathPattern,
    pub types: HashSet<RequestType>,
    pub condition: RuleCondition,
}

impl PolicyRule {
    pub fn new(path: PathPattern, types: HashSet<RequestType>, condition: RuleCondition) -> Self {
        Self {
            path,
            types,
            condition,
        }
    }

    /// Whether this rule applies to the given request at all.
    pub fn matches(&self, req: &RequestContext) -> bool {
        self.types.contains(&req.request_type) && self.path.matches(&req.path)
    }

    /// Evaluates the condition against a matched request.
    ///
    /// `None` means the rule expresses no opinion. An ownership mismatch is
    /// no opinion as well, not a reject; only the combination of all rules
    /// decides the request.
    pub fn evaluate(
        &self,
        req: &RequestContext,
        target: Option<&ResourceState>,
    ) -> Option<AuthzDecision> {
        match self.condition {
            RuleCondition::Unconditional => Some(AuthzDecision::Accept),
            RuleCondition::RoleIn(ref roles) => {
                let security = req.security.as_ref()?;
                if security.has_any_role(roles) {
                    Some(AuthzDecision::Accept)
                } else {
                    None
                }
            }
            RuleCondition::OwnerMatch(ref field) => {
                let security = req.security.as_ref()?;
                // An empty subject can never own anything
                if security.subject.is_empty() {
                    return None;
                }
                let owner = owner_candidate(field, req, target)?;
                if owner == security.subject {
                    Some(AuthzDecision::Accept)
                } else {
                    None
                }
            }
        }
    }
}

/// Extracts the owner value an ownership rule compares against: the target
/// state's property first (CREATE/UPDATE), falling back to the JSON query
/// blob under [`OWNER_QUERY_PARAM`] (READ). Malformed JSON yields no
/// candidate rather than an error.
fn owner_candidate(
    field: &str,
    req: &RequestContext,
    target: Option<&ResourceState>,
) -> Option<String> {
    if let Some(state) = target {
        if let Some(owner) = state.property_str(field) {
            return Some(owner.to_string());
        }
    }

    let raw = req.params.value(OWNER_QUERY_PARAM)?;
    let query: Value = serde_json::from_str(raw).ok()?;
    query.get(field)?.as_str().map(str::to_string)
}
