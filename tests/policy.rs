use once_cell::sync::Lazy;
use treegate::policy::config::PolicyConfig;
use treegate::policy::evaluator::PolicyEvaluator;
use treegate::policy::factory::PolicyFactory;
use treegate::policy::{
    decision_state, AuthzCheck, AuthzDecision, Policy, DECISION_PROPERTY, OWNER_QUERY_PARAM,
};
use treegate::types::request::{RequestContext, RequestType, ResourceParams, ResourcePath};
use treegate::types::security::SecurityContext;
use treegate::types::state::ResourceState;

const POLICY_TOML: &str = r#"
[[rules]]
path = "/app/**"
methods = ["read"]
roles = ["test-app/user", "test-app/admin"]

[[rules]]
path = "/app/**"
methods = ["create", "update", "delete"]
roles = ["test-app/admin"]

[[rules]]
path = "/public/**"
methods = ["*"]

[[rules]]
path = "/storage/**"
methods = ["*"]
roles = ["test-app/admin"]

[[rules]]
path = "/storage/**"
methods = ["*"]
owner_field = "user"
"#;

static EVALUATOR: Lazy<PolicyEvaluator> = Lazy::new(|| {
    let cfg: PolicyConfig = toml::from_str(POLICY_TOML).expect("parse policy toml");
    PolicyFactory::new()
        .build_evaluator(&cfg)
        .expect("build evaluator")
});

fn anonymous() -> SecurityContext {
    SecurityContext::anonymous()
}

fn admin() -> SecurityContext {
    SecurityContext::new("default", "admin").with_roles(["test-app/admin", "test-app/user"])
}

fn user() -> SecurityContext {
    SecurityContext::new("default", "john").with_roles(["test-app/user"])
}

fn request(request_type: RequestType, path: &str, security: SecurityContext) -> RequestContext {
    RequestContext::new(request_type, ResourcePath::new(path)).with_security(security)
}

fn assert_decision(check: &AuthzCheck, expected: AuthzDecision) {
    assert_eq!(EVALUATOR.decide(check), expected);
}

#[test]
fn missing_request_context_is_rejected() {
    assert_decision(&AuthzCheck::without_context(), AuthzDecision::Reject);

    // Through the trait boundary as well
    let policy: &dyn Policy = &*EVALUATOR;
    let decision = policy.authorize(&AuthzCheck::without_context()).unwrap();
    assert_eq!(decision, AuthzDecision::Reject);
}

#[test]
fn app_read_requires_a_role() {
    // Scenario A: /app/some READ is ignored for anonymous, accepted for
    // admin and for a caller holding test-app/user
    let check = AuthzCheck::new(request(RequestType::Read, "/app/some", anonymous()));
    assert_decision(&check, AuthzDecision::Ignore);

    let check = AuthzCheck::new(request(RequestType::Read, "/app/some", admin()));
    assert_decision(&check, AuthzDecision::Accept);

    let check = AuthzCheck::new(request(RequestType::Read, "/app/some", user()));
    assert_decision(&check, AuthzDecision::Accept);
}

#[test]
fn app_create_requires_admin() {
    // Scenario B: CREATE on /app/some is accepted for admin only
    let check = AuthzCheck::new(request(RequestType::Create, "/app/some", anonymous()));
    assert_decision(&check, AuthzDecision::Ignore);

    let check = AuthzCheck::new(request(RequestType::Create, "/app/some", admin()));
    assert_decision(&check, AuthzDecision::Accept);

    let check = AuthzCheck::new(request(RequestType::Create, "/app/some", user()));
    assert_decision(&check, AuthzDecision::Ignore);
}

#[test]
fn public_read_is_open_to_everyone() {
    // Scenario C: /public/some is accepted for every identity
    for security in [anonymous(), admin(), user()] {
        let check = AuthzCheck::new(request(RequestType::Read, "/public/some", security));
        assert_decision(&check, AuthzDecision::Accept);
    }
}

fn storage_read_with_query(security: SecurityContext, query: &str) -> AuthzCheck {
    let mut params = ResourceParams::new();
    params.put(OWNER_QUERY_PARAM, query);
    AuthzCheck::new(request(RequestType::Read, "/storage/some", security).with_params(params))
}

#[test]
fn storage_read_matches_query_owner() {
    // Scenario D: READ on /storage/some with q={"user":"john"}
    let query = r#"{"completed":"false","user":"john"}"#;

    let check = storage_read_with_query(anonymous(), query);
    assert_decision(&check, AuthzDecision::Ignore);

    // Admin is accepted by the role rule regardless of the query owner
    let check = storage_read_with_query(admin(), query);
    assert_decision(&check, AuthzDecision::Accept);

    // john owns the queried resources
    let check = storage_read_with_query(user(), query);
    assert_decision(&check, AuthzDecision::Accept);

    // Someone else's resources are not john's to read
    let check = storage_read_with_query(user(), r#"{"completed":"false","user":"otherUser"}"#);
    assert_decision(&check, AuthzDecision::Ignore);
}

#[test]
fn storage_read_with_malformed_query_is_ignored() {
    let check = storage_read_with_query(user(), "{not-json");
    assert_decision(&check, AuthzDecision::Ignore);
}

fn storage_write(request_type: RequestType, security: SecurityContext) -> AuthzCheck {
    AuthzCheck::new(request(request_type, "/storage/some", security))
}

fn owned_state(owner: &str) -> ResourceState {
    let mut state = ResourceState::new();
    state.put_property("user", owner);
    state.put_property("something", "something-which-does-not-matter");
    state
}

#[test]
fn storage_create_matches_target_state_owner() {
    for request_type in [RequestType::Create, RequestType::Update] {
        let state = owned_state("john");

        let check = storage_write(request_type, anonymous()).with_target(state.clone());
        assert_decision(&check, AuthzDecision::Ignore);

        let check = storage_write(request_type, admin()).with_target(state.clone());
        assert_decision(&check, AuthzDecision::Accept);

        let check = storage_write(request_type, user()).with_target(state);
        assert_decision(&check, AuthzDecision::Accept);

        // Admin may write someone else's resource, a plain user may not
        let state = owned_state("otherUser");
        let check = storage_write(request_type, admin()).with_target(state.clone());
        assert_decision(&check, AuthzDecision::Accept);

        let check = storage_write(request_type, user()).with_target(state);
        assert_decision(&check, AuthzDecision::Ignore);
    }
}

#[test]
fn storage_create_without_target_state_is_ignored() {
    let check = storage_write(RequestType::Create, user());
    assert_decision(&check, AuthzDecision::Ignore);
}

#[test]
fn evaluation_is_idempotent() {
    let check = storage_write(RequestType::Create, user()).with_target(owned_state("john"));
    let first = EVALUATOR.decide(&check);
    let second = EVALUATOR.decide(&check);
    assert_eq!(first, AuthzDecision::Accept);
    assert_eq!(first, second);
}

#[test]
fn decision_is_exposed_as_response_property() {
    let check = AuthzCheck::new(request(RequestType::Read, "/public/some", anonymous()));
    let state = decision_state(EVALUATOR.decide(&check));
    assert_eq!(state.property_str(DECISION_PROPERTY), Some("ACCEPT"));

    let state = decision_state(EVALUATOR.decide(&AuthzCheck::without_context()));
    assert_eq!(state.property_str(DECISION_PROPERTY), Some("REJECT"));
}
