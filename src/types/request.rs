use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::security::SecurityContext;

/// The kind of operation a request performs on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    #[serde(rename = "create")]
    Create,
    #[serde(rename = "read")]
    Read,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "delete")]
    Delete,
}

impl RequestType {
    pub const ALL: [RequestType; 4] = [
        RequestType::Create,
        RequestType::Read,
        RequestType::Update,
        RequestType::Delete,
    ];
}

#[derive(Error, Debug)]
#[error("unknown request method '{0}'")]
pub struct ParseRequestTypeError(String);

impl FromStr for RequestType {
    type Err = ParseRequestTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(RequestType::Create),
            "read" => Ok(RequestType::Read),
            "update" => Ok(RequestType::Update),
            "delete" => Ok(RequestType::Delete),
            _ => Err(ParseRequestTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestType::Create => "create",
            RequestType::Read => "read",
            RequestType::Update => "update",
            RequestType::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

/// An absolute resource path, stored as its ordered segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    /// Parses a path like `/storage/some`. Empty segments are skipped, so a
    /// trailing slash does not change the path.
    pub fn new(path: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

/// Query-style request parameters. Each name maps to an ordered list of
/// values.
#[derive(Debug, Clone, Default)]
pub struct ResourceParams {
    values: HashMap<String, Vec<String>>,
}

impl ResourceParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    /// First value for the given name, if any.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.first().map(String::as_str)
    }
}

impl From<HashMap<String, Vec<String>>> for ResourceParams {
    fn from(values: HashMap<String, Vec<String>>) -> Self {
        Self { values }
    }
}

/// A single resource request as seen by the policy engine. Built once per
/// request, read-only afterwards.
///
/// `security` may be absent when the upstream pipeline established a request
/// but no identity at all; policies treat that the same as anonymous. The
/// absence of the whole `RequestContext` is handled by the engine separately.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_type: RequestType,
    pub path: ResourcePath,
    pub security: Option<SecurityContext>,
    pub params: ResourceParams,
}

impl RequestContext {
    pub fn new(request_type: RequestType, path: ResourcePath) -> Self {
        Self {
            request_type,
            path,
            security: None,
            params: ResourceParams::default(),
        }
    }

    pub fn with_security(mut self, security: SecurityContext) -> Self {
        self.security = Some(security);
        self
    }

    pub fn with_params(mut self, params: ResourceParams) -> Self {
        self.params = params;
        self
    }
}
