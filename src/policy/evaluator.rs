use anyhow::Result;
use log::debug;

use super::rule::PolicyRule;
use super::{AuthzCheck, AuthzDecision, Policy};

/// The policy decision engine: an ordered, read-only rule set evaluated
/// against each request.
///
/// Evaluation is pure and free of I/O, so one evaluator can serve concurrent
/// requests without locking.
#[derive(Debug)]
pub struct PolicyEvaluator {
    rules: Vec<PolicyRule>,
}

impl PolicyEvaluator {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Decides one request.
    ///
    /// A check without request context is rejected outright. Otherwise every
    /// rule matching the request's path and type contributes its opinion,
    /// and the opinions are folded under REJECT > ACCEPT > IGNORE. No
    /// matching rule, or only abstaining rules, means IGNORE.
    pub fn decide(&self, check: &AuthzCheck) -> AuthzDecision {
        let req = match check.request {
            Some(ref req) => req,
            None => {
                debug!("Authorization check without request context, rejecting");
                return AuthzDecision::Reject;
            }
        };

        let decision = self
            .rules
            .iter()
            .filter(|rule| rule.matches(req))
            .filter_map(|rule| rule.evaluate(req, check.target.as_ref()))
            .fold(AuthzDecision::Ignore, AuthzDecision::combine);

        debug!("Authorize {} {}: {decision}", req.request_type, req.path);
        decision
    }
}

impl Policy for PolicyEvaluator {
    fn authorize(&self, check: &AuthzCheck) -> Result<AuthzDecision> {
        Ok(self.decide(check))
    }
}
