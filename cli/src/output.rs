//! Result printing for CLI commands.

use std::path::Path;

use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// YAML format (default).
    #[default]
    Yaml,
    /// JSON format.
    Json,
}

impl OutputFormat {
    /// JSON when `json` is set, YAML otherwise.
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Yaml }
    }

    /// Renders `value` in this format.
    pub fn render<T: Serialize>(self, value: &T) -> anyhow::Result<String> {
        Ok(match self {
            Self::Yaml => serde_yaml::to_string(value)?,
            Self::Json => {
                let mut s = serde_json::to_string_pretty(value)?;
                s.push('\n');
                s
            }
        })
    }
}

/// Writes a command result to stdout or to a file.
pub fn output_result<T: Serialize>(
    value: &T,
    path: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let rendered = format.render(value)?;
    match path {
        Some(path) => std::fs::write(path, rendered)?,
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Formats a byte count for humans.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Prints a success message to stderr.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints a warning message to stderr.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m!\x1b[0m {}", msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Summary {
        total: usize,
        succeeded: usize,
    }

    #[test]
    fn test_render() {
        let s = Summary {
            total: 3,
            succeeded: 2,
        };
        assert_eq!(
            OutputFormat::Yaml.render(&s).unwrap(),
            "total: 3\nsucceeded: 2\n"
        );
        let json = OutputFormat::from_flag(true).render(&s).unwrap();
        assert!(json.contains("\"succeeded\": 2"));
    }

    #[test]
    fn test_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        output_result(&[1, 2, 3], Some(&path), OutputFormat::Json).unwrap();
        let parsed: Vec<u8> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, [1, 2, 3]);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }
}
