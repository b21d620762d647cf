//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes rule evaluation over stdio so editors and assistants can ask where
//! a path would be filed without running a scan.
//!
//! # Architecture
//!
//! The MCP server is a presentation layer. It wraps the same core library that
//! the CLI commands use, and never writes to a catalog.

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use bucketeer_core::config::Config;
use bucketeer_core::rules::{MatchOutcome, RuleSet};
use bucketeer_core::template;

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `match_path` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct MatchPathParams {
    /// Resource path to evaluate, `/`-separated.
    pub path: String,
}

/// Parameters for the `resolve_template` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ResolveTemplateParams {
    /// Group-name template, e.g. `Art-%PATH%[2]`.
    pub template: String,
    /// Resource path whose segments fill the placeholders.
    pub path: String,
}

#[derive(Debug, serde::Serialize)]
struct MatchPathFailure {
    rule: usize,
    kind: &'static str,
    message: String,
}

#[derive(Debug, serde::Serialize)]
struct MatchPathResult {
    path: String,
    matches: Vec<MatchOutcome>,
    failures: Vec<MatchPathFailure>,
}

/// MCP server exposing rule evaluation to AI assistants.
#[derive(Clone)]
pub struct ProjectServer {
    rules: RuleSet,
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
}

impl Default for ProjectServer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))
}

#[tool_router]
impl ProjectServer {
    /// Create a server with no rules.
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Create a server that evaluates the rules in `config`.
    pub fn with_config(config: &Config) -> Self {
        Self {
            rules: RuleSet::compile(&config.rules),
            tool_router: Self::tool_router(),
        }
    }

    /// Get project information.
    #[tool(description = "Get project name, version, description, and the number of loaded rules")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");

        let text = if params.format == "json" {
            to_json(&serde_json::json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "description": env!("CARGO_PKG_DESCRIPTION"),
                "rules": self.rules.len(),
            }))?
        } else {
            format!(
                "{} v{}\n{}\n{} rules loaded",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
                self.rules.len(),
            )
        };

        tracing::info!(tool = "get_info", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Dry-run a path against the loaded rules.
    #[tool(
        description = "List every configured rule that matches a resource path, with the group each would file it under. Does not modify any catalog."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server", path = %params.path))]
    fn match_path(
        &self,
        Parameters(params): Parameters<MatchPathParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "match_path", "executing MCP tool");

        let mut result = MatchPathResult {
            path: params.path.clone(),
            matches: Vec::new(),
            failures: Vec::new(),
        };
        for outcome in self.rules.evaluate(&params.path) {
            match outcome {
                Ok(m) => result.matches.push(m),
                Err((rule, err)) => result.failures.push(MatchPathFailure {
                    rule,
                    kind: err.kind(),
                    message: err.to_string(),
                }),
            }
        }

        tracing::info!(
            tool = "match_path",
            matches = result.matches.len(),
            failures = result.failures.len(),
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(to_json(&result)?)]))
    }

    /// Expand a group-name template.
    #[tool(
        description = "Expand %PATH%[n] placeholders in a group-name template using the segments of a path. With span = segment count - 1, an index above span is reduced by span until it is not, and a negative index is raised by span until it is not negative. A path without '/' only accepts index 0."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn resolve_template(
        &self,
        Parameters(params): Parameters<ResolveTemplateParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "resolve_template", template = %params.template, "executing MCP tool");

        let resolved = template::resolve(&params.template, &params.path)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        tracing::info!(tool = "resolve_template", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(resolved)]))
    }
}

#[tool_handler]
impl ServerHandler for ProjectServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Use match_path to see how a resource path would be classified \
                 and resolve_template to preview group names.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}
