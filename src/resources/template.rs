//! URI templates with `{name}` placeholders.

use crate::error::{ConfigError, McpError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Placeholder syntax inside a template.
static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid regex: URI placeholder pattern")
});

/// A compiled URI template such as `greeting://{name}`.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    template: String,
    variables: Vec<String>,
    matcher: Regex,
}

impl UriTemplate {
    /// Compile a template. Each placeholder matches one non-empty path segment.
    pub fn parse(template: &str) -> Result<Self> {
        let mut pattern = String::from("^");
        let mut variables = Vec::new();
        let mut last = 0;

        for captures in PLACEHOLDER_REGEX.captures_iter(template) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if variables.iter().any(|v| v == name.as_str()) {
                return Err(invalid(template, "duplicate placeholder"));
            }

            pattern.push_str(&regex::escape(&template[last..whole.start()]));
            pattern.push_str(&format!("(?P<{}>[^/]+)", name.as_str()));
            variables.push(name.as_str().to_string());
            last = whole.end();
        }
        pattern.push_str(&regex::escape(&template[last..]));
        pattern.push('$');

        if PLACEHOLDER_REGEX
            .replace_all(template, "")
            .contains(['{', '}'])
        {
            return Err(invalid(template, "unbalanced braces"));
        }

        let matcher = Regex::new(&pattern).map_err(|e| invalid(template, &e.to_string()))?;

        Ok(Self {
            template: template.to_string(),
            variables,
            matcher,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Whether the template has no placeholders (a plain resource URI).
    pub fn is_static(&self) -> bool {
        self.variables.is_empty()
    }

    /// Extract placeholder values if `uri` matches.
    pub fn matches(&self, uri: &str) -> Option<HashMap<String, String>> {
        let captures = self.matcher.captures(uri)?;
        Some(
            self.variables
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

fn invalid(template: &str, message: &str) -> McpError {
    ConfigError::InvalidValue {
        field: "uri_template".into(),
        message: format!("{}: {}", template, message).into(),
    }
    .into()
}
