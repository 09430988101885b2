//! List Command - print the discovered registry

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;

use broadcast_core::{EmitFormat, EventRegistry, RegistryEmitter};

use super::Project;
use crate::cli::ListFormat;
use crate::output::ConsoleReporter;

pub async fn execute(project: &Project, format: ListFormat) -> Result<ExitCode> {
    let outcome = project.discover(Arc::new(ConsoleReporter::new())).await?;

    match format {
        ListFormat::Json => {
            println!("{}", RegistryEmitter::new(EmitFormat::Json).literal(&outcome.registry)?)
        }
        ListFormat::Text => print!("{}", render_text(&outcome.registry)),
    }

    Ok(ExitCode::SUCCESS)
}

/// One line per event type followed by its indented handlers
fn render_text(registry: &EventRegistry) -> String {
    let mut out = String::new();
    for (event, handlers) in registry.iter() {
        out.push_str(&format!("{}\n", event.bold()));
        for handler in handlers {
            let separator = if handler.is_static { "::" } else { "->" };
            out.push_str(&format!("  {}{}{}\n", handler.class, separator, handler.method));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_core::HandlerDescriptor;

    #[test]
    fn test_render_text() {
        colored::control::set_override(false);
        let registry = EventRegistry::from_descriptors([
            HandlerDescriptor::new("App\\Saved", "App\\Mailer", "onSaved", false),
            HandlerDescriptor::new("App\\Saved", "App\\Audit", "record", true),
        ]);

        assert_eq!(
            render_text(&registry),
            "App\\Saved\n  App\\Mailer->onSaved\n  App\\Audit::record\n"
        );
    }
}
