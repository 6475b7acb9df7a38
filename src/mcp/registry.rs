//! Tool and resource registry
//!
//! Maps tool names and resource URIs to async handlers together with the
//! metadata advertised to clients. Built once at startup and shared
//! read-only by the transports.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::{McpError, NotFoundError, Result};
use crate::mcp::types::{Resource, ResourceTemplate, Tool};

/// MIME type of every resource body served here
pub const JSON_MIME_TYPE: &str = "application/json";

/// Values extracted from a templated resource URI
pub type ResourceParams = HashMap<String, String>;

/// What a tool handler produces
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Json(Value),
}

impl ToolOutput {
    /// Text form sent back to the caller
    pub fn into_text(self) -> String {
        match self {
            ToolOutput::Text(text) => text,
            ToolOutput::Json(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

type ToolFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<ToolOutput>> + Send + Sync>;
type ResourceFn = Arc<dyn Fn(ResourceParams) -> BoxFuture<'static, Result<String>> + Send + Sync>;

struct RegisteredTool {
    definition: Tool,
    handler: ToolFn,
}

struct RegisteredResource {
    definition: Resource,
    handler: ResourceFn,
}

struct RegisteredTemplate {
    definition: ResourceTemplate,
    template: UriTemplate,
    handler: ResourceFn,
}

/// Registry of tools, static resources and resource templates
#[derive(Default)]
pub struct Registry {
    tools: Vec<RegisteredTool>,
    resources: Vec<RegisteredResource>,
    templates: Vec<RegisteredTemplate>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool whose arguments deserialize into `A`.
    ///
    /// The advertised input schema is derived from `A`. Registering a name
    /// twice replaces the earlier handler.
    pub fn tool<A, F, Fut>(&mut self, name: &str, description: &str, handler: F) -> &mut Self
    where
        A: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let tool_name = name.to_string();
        let erased: ToolFn = Arc::new(move |args: Value| -> BoxFuture<'static, Result<ToolOutput>> {
            let handler = handler.clone();
            let tool_name = tool_name.clone();
            Box::pin(async move {
                let args: A = serde_json::from_value(normalize_args(args)).map_err(|e| {
                    McpError::InvalidArguments {
                        message: format!("{}: {}", tool_name, e),
                    }
                })?;
                (*handler)(args).await
            })
        });

        let definition = Tool {
            name: name.to_string(),
            description: Some(description.to_string()),
            input_schema: input_schema::<A>(),
        };

        self.tools.retain(|t| t.definition.name != name);
        self.tools.push(RegisteredTool {
            definition,
            handler: erased,
        });
        self
    }

    /// Register a resource at a fixed URI
    pub fn resource<F, Fut>(
        &mut self,
        uri: &str,
        name: &str,
        description: &str,
        handler: F,
    ) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let erased: ResourceFn = Arc::new(
            move |_params: ResourceParams| -> BoxFuture<'static, Result<String>> {
                Box::pin(handler())
            },
        );

        self.resources.push(RegisteredResource {
            definition: Resource {
                uri: uri.to_string(),
                name: name.to_string(),
                description: Some(description.to_string()),
                mime_type: Some(JSON_MIME_TYPE.to_string()),
            },
            handler: erased,
        });
        self
    }

    /// Register a resource addressed by a `{param}` URI template
    pub fn resource_template<F, Fut>(
        &mut self,
        uri_template: &str,
        name: &str,
        description: &str,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(ResourceParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let erased: ResourceFn = Arc::new(
            move |params: ResourceParams| -> BoxFuture<'static, Result<String>> {
                Box::pin(handler(params))
            },
        );

        self.templates.push(RegisteredTemplate {
            definition: ResourceTemplate {
                uri_template: uri_template.to_string(),
                name: name.to_string(),
                description: Some(description.to_string()),
                mime_type: Some(JSON_MIME_TYPE.to_string()),
            },
            template: UriTemplate::parse(uri_template),
            handler: erased,
        });
        self
    }

    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn list_resources(&self) -> Vec<Resource> {
        self.resources.iter().map(|r| r.definition.clone()).collect()
    }

    pub fn list_resource_templates(&self) -> Vec<ResourceTemplate> {
        self.templates.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn has_resources(&self) -> bool {
        !self.resources.is_empty() || !self.templates.is_empty()
    }

    /// Invoke a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<ToolOutput> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.definition.name == name)
            .ok_or_else(|| NotFoundError::Tool {
                name: name.to_string(),
            })?;

        (tool.handler)(args).await
    }

    /// Read a resource; fixed URIs win over templates, templates match in
    /// registration order
    pub async fn read_resource(&self, uri: &str) -> Result<String> {
        if let Some(resource) = self.resources.iter().find(|r| r.definition.uri == uri) {
            return (resource.handler)(ResourceParams::new()).await;
        }

        for registered in &self.templates {
            if let Some(params) = registered.template.match_uri(uri) {
                return (registered.handler)(params).await;
            }
        }

        Err(NotFoundError::Resource {
            uri: uri.to_string(),
        }
        .into())
    }
}

/// Tools without arguments may be called with `null`
fn normalize_args(args: Value) -> Value {
    if args.is_null() {
        json!({})
    } else {
        args
    }
}

fn input_schema<A: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(A);
    serde_json::to_value(schema).unwrap_or_else(|_| json!({ "type": "object" }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A URI pattern with `{name}` placeholders.
///
/// A placeholder matches a non-empty run of characters up to the next literal
/// segment and never spans a `/`. Matched values are percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    segments: Vec<Segment>,
}

impl UriTemplate {
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|i| open + i) else {
                break;
            };
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            segments.push(Segment::Param(rest[open + 1..close].to_string()));
            rest = &rest[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Self { segments }
    }

    pub fn match_uri(&self, uri: &str) -> Option<ResourceParams> {
        let mut params = ResourceParams::new();
        let mut rest = uri;

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    rest = rest.strip_prefix(literal.as_str())?;
                }
                Segment::Param(name) => {
                    let end = match self.segments.get(i + 1) {
                        Some(Segment::Literal(next)) => rest.find(next.as_str())?,
                        _ => rest.len(),
                    };
                    let raw = &rest[..end];
                    if raw.is_empty() || raw.contains('/') {
                        return None;
                    }
                    let value = urlencoding::decode(raw).ok()?.into_owned();
                    params.insert(name.clone(), value);
                    rest = &rest[end..];
                }
            }
        }

        rest.is_empty().then_some(params)
    }
}
