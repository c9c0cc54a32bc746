//! Template exporter
//!
//! Renders user-supplied Jinja templates (via `minijinja`) in one of two
//! modes.
//!
//! **Full mode** buffers every row and renders a single template once with:
//! - `Rows`: list of rows, each a map keyed by column name in column order
//! - `Columns`: column names
//! - `Count`: number of rows
//! - `GeneratedAt`: RFC 3339 timestamp
//!
//! **Streaming mode** renders an optional header template once with
//! `Columns` and `GeneratedAt`, the row template for every row with `Row`,
//! `Columns` and `Index` (1-based), and an optional footer template once with
//! `Columns`, `Count` and `GeneratedAt`. Only one row is held in memory.
//!
//! Templates keep their trailing newline, and output is never HTML-escaped.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat};
use minijinja::value::{Value as TemplateValue, ValueKind};
use minijinja::{AutoEscape, Environment, ErrorKind, context};
use tracing::debug;

use crate::cursor::Cursor;
use crate::encoder::OrderedRow;
use crate::error::{ConfigError, ExportError, Result};
use crate::export::progress::ProgressTracker;
use crate::export::{ExportOptions, Exporter};
use crate::formatter::{TemplateConverter, TimeLayout};
use crate::output::with_sink;

use super::drain_rows;

/// Writer for user templates
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateExporter;

impl Exporter for TemplateExporter {
    fn export(&self, cursor: &mut dyn Cursor, options: &ExportOptions) -> Result<u64> {
        options.validate()?;
        if options.template_streaming {
            export_streaming(cursor, options)
        } else {
            export_full(cursor, options)
        }
    }
}

fn export_full(cursor: &mut dyn Cursor, options: &ExportOptions) -> Result<u64> {
    debug!(
        "Preparing TEMPLATE (full mode) export (compression={})",
        options.compression
    );

    let path = options
        .template_file
        .as_deref()
        .ok_or_else(|| ConfigError::MissingField("tpl-file".to_string()))?;
    let source = read_template(path)?;

    let mut env = template_env();
    env.add_template("full", &source)?;
    let template = env.get_template("full")?;

    let converter = TemplateConverter::new(options.time_context());
    let fields = cursor.field_descriptors().to_vec();
    let columns = cursor.column_names();

    with_sink(&options.sink_config(), |sink| {
        let mut rows = Vec::new();
        let mut tracker = ProgressTracker::new("TEMPLATE", options.progress);
        let count = drain_rows(cursor, &mut tracker, |_, values| {
            rows.push(TemplateValue::from_object(OrderedRow::build(
                &fields, &values, &converter,
            )));
            Ok(())
        })?;

        template.render_captured_to(
            context! {
                Rows => TemplateValue::from(rows),
                Columns => &columns,
                Count => count,
                GeneratedAt => generated_at(),
            },
            &mut *sink,
        )?;
        tracker.finish();
        Ok(count)
    })
}

fn export_streaming(cursor: &mut dyn Cursor, options: &ExportOptions) -> Result<u64> {
    debug!(
        "Preparing TEMPLATE (streaming mode) export (compression={})",
        options.compression
    );

    let row_path = options
        .template_row
        .as_deref()
        .ok_or_else(|| ConfigError::MissingField("tpl-row".to_string()))?;
    let row_source = read_template(row_path)?;
    let header_source = options.template_header.as_deref().map(read_template).transpose()?;
    let footer_source = options.template_footer.as_deref().map(read_template).transpose()?;

    let mut env = template_env();
    env.add_template("row", &row_source)?;
    if let Some(source) = &header_source {
        env.add_template("header", source)?;
    }
    if let Some(source) = &footer_source {
        env.add_template("footer", source)?;
    }

    let converter = TemplateConverter::new(options.time_context());
    let fields = cursor.field_descriptors().to_vec();
    let columns = cursor.column_names();
    let generated_at = generated_at();

    with_sink(&options.sink_config(), |sink| {
        if header_source.is_some() {
            env.get_template("header")?.render_captured_to(
                context! { Columns => &columns, GeneratedAt => &generated_at },
                &mut *sink,
            )?;
        }

        let row_template = env.get_template("row")?;
        let mut tracker = ProgressTracker::new("TEMPLATE", options.progress);
        let count = drain_rows(cursor, &mut tracker, |index, values| {
            let row = TemplateValue::from_object(OrderedRow::build(&fields, &values, &converter));
            row_template.render_captured_to(
                context! { Row => row, Columns => &columns, Index => index },
                &mut *sink,
            )?;
            Ok(())
        })?;

        if footer_source.is_some() {
            env.get_template("footer")?.render_captured_to(
                context! { Columns => &columns, Count => count, GeneratedAt => &generated_at },
                &mut *sink,
            )?;
        }

        tracker.finish();
        Ok(count)
    })
}

fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        ExportError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read template file {}: {e}", path.display()),
        ))
    })
}

fn generated_at() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Environment with the helper functions registered.
fn template_env<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_formatter(|out, state, value| {
        if value.kind() == ValueKind::Bool {
            out.write_str(if value.is_true() { "true" } else { "false" })?;
            Ok(())
        } else {
            minijinja::escape_formatter(out, state, value)
        }
    });
    register_helpers(&mut env);
    env
}

fn register_helpers(env: &mut Environment<'_>) {
    env.add_function("get", |row: TemplateValue, key: &str| row.get_attr(key));

    env.add_function("upper", |s: TemplateValue| text(&s).to_uppercase());
    env.add_function("lower", |s: TemplateValue| text(&s).to_lowercase());
    env.add_function("title", |s: TemplateValue| title_case(&text(&s)));
    env.add_function("trim", |s: TemplateValue| text(&s).trim().to_string());
    env.add_function("replace", |s: TemplateValue, old: &str, new: &str| {
        text(&s).replace(old, new)
    });
    env.add_function(
        "join",
        |list: TemplateValue, sep: &str| -> std::result::Result<String, minijinja::Error> {
            let parts: Vec<String> = list.try_iter()?.map(|item| text(&item)).collect();
            Ok(parts.join(sep))
        },
    );
    env.add_function("split", |s: TemplateValue, sep: &str| {
        text(&s).split(sep).map(str::to_string).collect::<Vec<_>>()
    });
    env.add_function("contains", |s: TemplateValue, sub: &str| text(&s).contains(sub));
    env.add_function("hasPrefix", |s: TemplateValue, prefix: &str| {
        text(&s).starts_with(prefix)
    });
    env.add_function("hasSuffix", |s: TemplateValue, suffix: &str| {
        text(&s).ends_with(suffix)
    });

    env.add_function("json", |v: TemplateValue| {
        serde_json::to_string(&v).unwrap_or_else(|e| format!("ERROR: {e}"))
    });
    env.add_function("jsonPretty", |v: TemplateValue| {
        serde_json::to_string_pretty(&v).unwrap_or_else(|e| format!("ERROR: {e}"))
    });
    env.add_function("now", generated_at);
    env.add_function("formatTime", format_time);

    env.add_function("eq", |a: TemplateValue, b: TemplateValue| a == b);
    env.add_function("ne", |a: TemplateValue, b: TemplateValue| a != b);
    env.add_function("add", |a: i64, b: i64| a.saturating_add(b));
    env.add_function("sub", |a: i64, b: i64| a.saturating_sub(b));
    env.add_function("mul", |a: i64, b: i64| a.saturating_mul(b));
    env.add_function("div", |a: i64, b: i64| a.checked_div(b).unwrap_or(0));
}

/// String content of a value; non-strings use their display form.
fn text(value: &TemplateValue) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None if value.is_none() || value.is_undefined() => String::new(),
        None if value.kind() == ValueKind::Bool => value.is_true().to_string(),
        None => value.to_string(),
    }
}

/// Upper-case the first letter of every word, lower-case the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Re-render a timestamp string with a `yyyy-MM-dd`-style layout.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS[.f]`
/// and plain dates.
fn format_time(value: TemplateValue, layout: &str) -> std::result::Result<String, minijinja::Error> {
    let raw = text(&value);
    let raw = raw.trim();

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
        });

    match parsed {
        Ok(ts) => Ok(TimeLayout::parse(layout).render(&ts)),
        Err(_) => Err(minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("formatTime: cannot parse {raw:?} as a time"),
        )),
    }
}
