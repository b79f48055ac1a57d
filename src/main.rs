use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::debug;
use treegate::config::{ConfigArgs, GateConfig};
use treegate::policy::factory::PolicyFactory;
use treegate::policy::{decision_state, AuthzCheck, AuthzDecision, OWNER_QUERY_PARAM};
use treegate::types::request::{RequestContext, RequestType, ResourceParams, ResourcePath};
use treegate::types::security::SecurityContext;
use treegate::types::state::ResourceState;

/// Check a request against the configured authorization rules.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct CheckArgs {
    /// Request method: create, read, update or delete.
    method: Option<String>,

    /// Resource path to check, e.g. "/storage/some".
    path: Option<String>,

    /// Caller subject. Empty means anonymous.
    #[arg(long, default_value = "")]
    subject: String,

    /// Caller realm.
    #[arg(long, default_value = "default")]
    realm: String,

    /// Caller roles, split with comma.
    #[arg(long, default_value = "")]
    roles: String,

    /// JSON query blob passed as the "q" request parameter.
    #[arg(short, long)]
    query: Option<String>,

    /// Target resource state (JSON) for create/update checks.
    #[arg(short, long)]
    state: Option<String>,

    /// Print the full response state (JSON) instead of the bare decision.
    #[arg(long)]
    json: bool,

    /// Print configuration data (JSON) and exit.
    #[arg(long)]
    print_config: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

fn run(args: CheckArgs) -> Result<ExitCode> {
    let cfg: GateConfig = args.config.load("treegate")?;

    if args.print_config {
        let json = serde_json::to_string_pretty(&cfg).context("serialize config")?;
        println!("{json}");
        return Ok(ExitCode::SUCCESS);
    }

    cfg.logs.init("treegate")?;

    let method = match args.method {
        Some(ref method) => method,
        None => bail!("method is required"),
    };
    let path = match args.path {
        Some(ref path) => path,
        None => bail!("path is required"),
    };

    let request_type: RequestType = method.parse()?;
    let path = ResourcePath::new(path);

    let mut security = SecurityContext::new(args.realm, args.subject);
    if !args.roles.is_empty() {
        security = security.with_roles(args.roles.split(','));
    }

    let mut request = RequestContext::new(request_type, path).with_security(security);
    if let Some(query) = args.query {
        let mut params = ResourceParams::new();
        params.put(OWNER_QUERY_PARAM, query);
        request = request.with_params(params);
    }

    let mut check = AuthzCheck::new(request);
    if let Some(ref raw) = args.state {
        let state: ResourceState = serde_json::from_str(raw).context("parse state json")?;
        check = check.with_target(state);
    }

    let evaluator = PolicyFactory::new().build_evaluator(&cfg.policy)?;
    let decision = evaluator.decide(&check);
    debug!("Decision: {decision}");

    if args.json {
        let state = decision_state(decision);
        let json = serde_json::to_string_pretty(&state).context("serialize response state")?;
        println!("{json}");
    } else {
        println!("{decision}");
    }

    Ok(if decision == AuthzDecision::Accept {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> ExitCode {
    let args = CheckArgs::parse();
    match run(args) {
        Ok(code) => code,
        Err(err) => {
            _ = writeln!(io::stderr(), "Fatal: {err:#}");
            ExitCode::FAILURE
        }
    }
}
