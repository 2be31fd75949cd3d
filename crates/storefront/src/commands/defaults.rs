//! `storefront defaults`: print the builtin default documents.

use serde::Serialize;
use serde_json::{Map, Value};
use tabled::Tabled;

use storefront_core::{DefaultConfig, DeckSource, DocumentKind};

use crate::cli::{DefaultsArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct DocumentSummary {
    document: DocumentKind,
    keys: Vec<String>,
    slides: Option<usize>,
}

#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "Document")]
    document: String,
    #[tabled(rename = "Top-level keys")]
    keys: String,
    #[tabled(rename = "Slides")]
    slides: String,
}

fn summarize(defaults: &DefaultConfig, kind: DocumentKind) -> DocumentSummary {
    let value = defaults.get(kind);
    let keys = value
        .as_object()
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default();
    let slides = DeckSource::for_document(kind).map(|source| {
        value
            .pointer(&source.pointer)
            .and_then(|deck| deck.get("slides"))
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    });
    DocumentSummary {
        document: kind,
        keys,
        slides,
    }
}

pub fn handle(args: &DefaultsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let defaults = DefaultConfig::builtin();

    let out = match args.document {
        Some(kind) => {
            let value = defaults.get(kind);
            output::render_single(
                global.output,
                value.as_ref(),
                |v| output::render_json_pretty(v),
                ToString::to_string,
            )?
        }
        // Structured formats get every document keyed by name
        None if matches!(
            global.output,
            OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml
        ) =>
        {
            let all: Map<String, Value> = DocumentKind::all()
                .into_iter()
                .map(|kind| (kind.to_string(), defaults.get(kind).as_ref().clone()))
                .collect();
            output::render_single(global.output, &all, |_| Ok(String::new()), |_| String::new())?
        }
        None => {
            let summaries: Vec<_> = DocumentKind::all()
                .into_iter()
                .map(|kind| summarize(&defaults, kind))
                .collect();
            output::render_list(
                global.output,
                &summaries,
                |s| DocumentRow {
                    document: s.document.to_string(),
                    keys: s.keys.join(", "),
                    slides: s.slides.map_or_else(|| "-".into(), |n| n.to_string()),
                },
                |s| s.document.to_string(),
            )?
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summaries_count_default_slides() {
        let defaults = DefaultConfig::builtin();
        assert_eq!(summarize(&defaults, DocumentKind::Heroes).slides, Some(3));
        assert_eq!(summarize(&defaults, DocumentKind::Banners).slides, Some(2));
        assert_eq!(summarize(&defaults, DocumentKind::Layout).slides, Some(3));
        assert_eq!(summarize(&defaults, DocumentKind::Theme).slides, None);
        assert!(summarize(&defaults, DocumentKind::Theme).keys.contains(&"colors".to_string()));
    }
}
