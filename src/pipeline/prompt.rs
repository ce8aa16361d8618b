//! Prompt construction: template + extracted text + format instructions.
//!
//! Pure string work; no I/O. The template is rendered in a single left-to-right
//! pass and substituted values are never re-scanned, so résumé text that
//! happens to contain `{format_instructions}` cannot pull in another slot.

use crate::config::ExtractionConfig;
use crate::prompts::RESUME_EXTRACTION_TEMPLATE;
use crate::schema::SchemaDescriptor;

/// Build the model prompt for one résumé.
pub fn build_prompt(schema: &SchemaDescriptor, resume_text: &str, config: &ExtractionConfig) -> String {
    let template = config
        .prompt_template
        .as_deref()
        .unwrap_or(RESUME_EXTRACTION_TEMPLATE);
    let format_instructions = schema.format_instructions();

    render_template(
        template,
        &[
            ("resume_text", resume_text),
            ("format_instructions", &format_instructions),
            ("target_language", &config.target_language),
        ],
    )
}

/// Replace every `{key}` with its value in one pass.
///
/// Braces that do not enclose a known key are copied through unchanged.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let substituted = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, close))
        });

        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
