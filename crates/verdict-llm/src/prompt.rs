//! MiniJinja prompt templates
//!
//! Prompts are Jinja2 templates rendered against a JSON context:
//! `{{ ticker }}`, `{% for h in headlines %}...{% endfor %}`, filters such as
//! `{{ value | pct }}`.

use crate::{ModelError, Result};
use minijinja::Environment;
use serde::Serialize;

/// A named prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    name: String,
    source: String,
}

impl PromptTemplate {
    /// Create a template, checking that it parses
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let template = Self {
            name: name.into(),
            source: source.into(),
        };
        let env = environment();
        env.template_from_str(&template.source).map_err(|e| {
            ModelError::ConfigurationError(format!(
                "Failed to parse template '{}': {e}",
                template.name
            ))
        })?;
        Ok(template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render against any serializable context
    pub fn render<S: Serialize>(&self, context: &S) -> Result<String> {
        let env = environment();
        env.render_str(&self.source, minijinja::Value::from_serialize(context))
            .map_err(|e| {
                ModelError::InvalidRequest(format!("Failed to render template '{}': {e}", self.name))
            })
    }
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.add_filter("pct", |value: f64| format!("{:.1}%", value * 100.0));
    env.add_filter("fixed", |value: f64| format!("{value:.2}"));
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_loop_and_filters() {
        let template = PromptTemplate::new(
            "headlines",
            "{{ ticker }}:{% for h in headlines %} [{{ loop.index }}] {{ h }}{% endfor %} growth {{ growth | pct }}",
        )
        .unwrap();
        let text = template
            .render(&json!({"ticker": "AAPL", "headlines": ["Beat", "Upgrade"], "growth": 0.2}))
            .unwrap();
        assert_eq!(text, "AAPL: [1] Beat [2] Upgrade growth 20.0%");
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = PromptTemplate::new("broken", "{% for x in %}").unwrap_err();
        assert!(matches!(err, ModelError::ConfigurationError(_)));
    }
}
