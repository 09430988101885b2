//! Registry emitter
//!
//! Serializes an [`EventRegistry`] into literal data for generated source and
//! embeds it into a template. Output depends only on registry content: the same
//! keys, order and records always produce the same bytes.

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::str::FromStr;

use crate::error::TemplateError;
use crate::registry::EventRegistry;

/// Substitution point inside a provider template
pub const PLACEHOLDER: &str = "['%s']";

/// Literal syntax the registry is emitted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitFormat {
    /// PHP array literal in `var_export` layout
    #[default]
    Php,
    /// Pretty-printed JSON
    Json,
}

impl FromStr for EmitFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "php" => Ok(Self::Php),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown emit format '{other}' (expected php or json)")),
        }
    }
}

/// Serializes registries into literal data
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryEmitter {
    format: EmitFormat,
}

impl RegistryEmitter {
    pub fn new(format: EmitFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> EmitFormat {
        self.format
    }

    /// Literal representation of the registry
    pub fn literal(&self, registry: &EventRegistry) -> Result<String, TemplateError> {
        match self.format {
            EmitFormat::Php => Ok(export_php(registry)),
            EmitFormat::Json => serde_json::to_string_pretty(registry)
                .map_err(|e| TemplateError::Serialize(e.to_string())),
        }
    }

    /// Embed the registry literal into `template`
    pub fn render(
        &self,
        template: &Template,
        registry: &EventRegistry,
    ) -> Result<String, TemplateError> {
        let literal = self.literal(registry)?;
        Ok(template.substitute(&literal))
    }
}

/// Generated-source template with a single substitution point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
}

impl Template {
    /// Validate and wrap template text
    pub fn parse(text: impl Into<String>) -> Result<Self, TemplateError> {
        let text = text.into();
        if !text.contains(PLACEHOLDER) {
            return Err(TemplateError::MissingPlaceholder(PLACEHOLDER));
        }
        Ok(Self { text })
    }

    fn substitute(&self, literal: &str) -> String {
        self.text.replace(PLACEHOLDER, literal)
    }
}

/// Render the registry the way PHP's `var_export` renders nested arrays
fn export_php(registry: &EventRegistry) -> String {
    let mut out = String::from("array (\n");

    // Writing to a String cannot fail
    for (event, handlers) in registry.iter() {
        let _ = writeln!(out, "  {} => ", php_string(event));
        out.push_str("  array (\n");
        for (index, handler) in handlers.iter().enumerate() {
            let _ = writeln!(out, "    {index} => ");
            out.push_str("    array (\n");
            let _ = writeln!(out, "      'class' => {},", php_string(&handler.class));
            let _ = writeln!(out, "      'method' => {},", php_string(&handler.method));
            let _ = writeln!(out, "      'static' => {},", handler.is_static);
            out.push_str("    ),\n");
        }
        out.push_str("  ),\n");
    }

    out.push(')');
    out
}

/// Single-quoted PHP string literal
fn php_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\0' => quoted.push_str("' . \"\\0\" . '"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('\'');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HandlerDescriptor;

    fn sample() -> EventRegistry {
        EventRegistry::from_descriptors(vec![
            HandlerDescriptor::new("App\\Event\\FooEvent", "App\\A", "onFoo", false),
            HandlerDescriptor::new("App\\Event\\BarEvent", "App\\B", "onBar", true),
        ])
    }

    #[test]
    fn test_php_literal_matches_var_export_layout() {
        let literal = RegistryEmitter::default().literal(&sample()).unwrap();

        let expected = concat!(
            "array (\n",
            "  'App\\\\Event\\\\FooEvent' => \n",
            "  array (\n",
            "    0 => \n",
            "    array (\n",
            "      'class' => 'App\\\\A',\n",
            "      'method' => 'onFoo',\n",
            "      'static' => false,\n",
            "    ),\n",
            "  ),\n",
            "  'App\\\\Event\\\\BarEvent' => \n",
            "  array (\n",
            "    0 => \n",
            "    array (\n",
            "      'class' => 'App\\\\B',\n",
            "      'method' => 'onBar',\n",
            "      'static' => true,\n",
            "    ),\n",
            "  ),\n",
            ")",
        );
        assert_eq!(literal, expected);
    }

    #[test]
    fn test_empty_registry_literal() {
        let literal = RegistryEmitter::default()
            .literal(&EventRegistry::default())
            .unwrap();
        assert_eq!(literal, "array (\n)");
    }

    #[test]
    fn test_php_string_escapes_quotes() {
        assert_eq!(php_string("it's"), "'it\\'s'");
        assert_eq!(php_string("A\\B"), "'A\\\\B'");
    }

    #[test]
    fn test_json_literal_keeps_order() {
        let literal = RegistryEmitter::new(EmitFormat::Json)
            .literal(&sample())
            .unwrap();

        let foo = literal.find("FooEvent").unwrap();
        let bar = literal.find("BarEvent").unwrap();
        assert!(foo < bar);
        assert!(literal.contains("\"static\": true"));
    }

    #[test]
    fn test_render_substitutes_placeholder() {
        let template = Template::parse(
            "<?php\nabstract class AbstractListenerProvider\n{\n    private const LISTENERS = ['%s'];\n}\n",
        )
        .unwrap();

        let rendered = RegistryEmitter::default()
            .render(&template, &EventRegistry::default())
            .unwrap();

        assert!(rendered.contains("private const LISTENERS = array (\n);"));
        assert!(!rendered.contains(PLACEHOLDER));
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        assert_eq!(
            Template::parse("<?php // nothing to see"),
            Err(TemplateError::MissingPlaceholder(PLACEHOLDER))
        );
    }

    #[test]
    fn test_rendering_is_byte_stable() {
        let emitter = RegistryEmitter::default();
        let first = emitter.literal(&sample()).unwrap();
        let second = emitter.literal(&sample()).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("PHP".parse::<EmitFormat>(), Ok(EmitFormat::Php));
        assert_eq!("json".parse::<EmitFormat>(), Ok(EmitFormat::Json));
        assert!("yaml".parse::<EmitFormat>().is_err());
    }
}
