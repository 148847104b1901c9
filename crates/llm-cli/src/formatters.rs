//! Output formatters for CLI commands.
//!
//! Provides consistent formatting of informational results for JSON, text,
//! and pretty output modes. Generated files never pass through here.

use anyhow::Result;
use colored::Colorize;
use llm_tools_core::cli::OutputFormat;
use serde::Serialize;

/// Format data according to the specified output format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Examples
///
/// ```
/// use llm_tools_cli::formatters::format_output;
/// use llm_tools_core::cli::OutputFormat;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct WhereResult {
///     path: String,
/// }
///
/// let result = WhereResult {
///     path: "/home/user/.llm-tools/config.toml".to_string(),
/// };
///
/// let output = format_output(&result, OutputFormat::Json)?;
/// assert!(output.contains("\"path\""));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format(data),
        OutputFormat::Text => text::format(data),
        OutputFormat::Pretty => pretty::format(data),
    }
}

/// JSON output formatting.
pub mod json {
    use super::{Result, Serialize};

    /// Format data as pretty-printed JSON.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }
}

/// Plain text output formatting.
pub mod text {
    use super::{Result, Serialize};
    use serde_json::Value;

    /// Format data as `key: value` lines without colors.
    ///
    /// Nested objects use dotted keys, so the output is easy to grep.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut lines = Vec::new();
        flatten("", &value, &mut lines);
        Ok(lines.join("\n"))
    }

    fn flatten(prefix: &str, value: &Value, lines: &mut Vec<String>) {
        match value {
            Value::Object(obj) => {
                for (key, val) in obj {
                    let key = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    flatten(&key, val, lines);
                }
            }
            Value::String(s) => lines.push(line(prefix, s)),
            Value::Null => lines.push(line(prefix, "")),
            other => lines.push(line(prefix, &other.to_string())),
        }
    }

    fn line(key: &str, value: &str) -> String {
        if key.is_empty() {
            value.to_string()
        } else {
            format!("{key}: {value}")
        }
    }
}

/// Pretty (human-readable) output formatting.
pub mod pretty {
    use super::{Colorize, Result, Serialize};
    use serde_json::Value;

    /// Format data as colorized, indented `key: value` lines.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut out = String::new();
        format_value(&value, 0, &mut out);
        Ok(out.trim_end().to_string())
    }

    fn format_value(value: &Value, indent: usize, out: &mut String) {
        let pad = "  ".repeat(indent);
        match value {
            Value::Object(obj) => {
                for (key, val) in obj {
                    out.push_str(&pad);
                    out.push_str(&key.replace('_', " ").blue().bold().to_string());
                    out.push(':');
                    if matches!(val, Value::Object(o) if !o.is_empty()) {
                        out.push('\n');
                        format_value(val, indent + 1, out);
                    } else {
                        out.push(' ');
                        out.push_str(&scalar(val));
                        out.push('\n');
                    }
                }
            }
            other => {
                out.push_str(&pad);
                out.push_str(&scalar(other));
                out.push('\n');
            }
        }
    }

    fn scalar(value: &Value) -> String {
        match value {
            Value::Null => "(not set)".dimmed().to_string(),
            Value::Bool(true) => "yes".green().to_string(),
            Value::Bool(false) => "no".yellow().to_string(),
            Value::Number(n) => n.to_string().cyan().to_string(),
            Value::String(s) => s.green().to_string(),
            Value::Object(_) => "{}".to_string(),
            Value::Array(items) => items
                .iter()
                .map(scalar)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Nested {
        openai_api_key: Option<String>,
    }

    #[derive(Serialize)]
    struct TestData {
        path: String,
        exists: bool,
        files: usize,
        config: Nested,
    }

    fn data() -> TestData {
        TestData {
            path: "/tmp/config.toml".to_string(),
            exists: true,
            files: 2,
            config: Nested {
                openai_api_key: None,
            },
        }
    }

    #[test]
    fn test_json_format() {
        let output = json::format(&data()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["path"], "/tmp/config.toml");
        assert_eq!(parsed["files"], 2);
        assert!(parsed["config"]["openai_api_key"].is_null());
    }

    #[test]
    fn test_text_format() {
        let output = text::format(&data()).unwrap();
        assert_eq!(
            output,
            "path: /tmp/config.toml\nexists: true\nfiles: 2\nconfig.openai_api_key: "
        );
    }

    #[test]
    fn test_text_format_bare_string() {
        let output = text::format(&"hello").unwrap();
        assert_eq!(output, "hello");
    }

    #[test]
    fn test_pretty_format_contains_values() {
        colored::control::set_override(false);
        let output = pretty::format(&data()).unwrap();
        assert!(output.contains("path: /tmp/config.toml"));
        assert!(output.contains("exists: yes"));
        assert!(output.contains("config:\n  openai api key: (not set)"));
    }

    #[test]
    fn test_format_output_dispatch() {
        let json_out = format_output(&data(), OutputFormat::Json).unwrap();
        assert!(json_out.starts_with('{'));
        let text_out = format_output(&data(), OutputFormat::Text).unwrap();
        assert!(text_out.starts_with("path: "));
    }
}
