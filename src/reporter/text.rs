//! Plain text report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::{Module, ScanResult, ScannedRoot};
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

/// Text report generator for CLI output.
pub struct TextReporter {
    /// Whether to use colors
    use_colors: bool,
}

impl TextReporter {
    /// Create a new text reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            use_colors: config.output.colored,
        }
    }
}

impl ReportGenerator for TextReporter {
    fn generate(&self, result: &ScanResult) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header());
        output.push('\n');

        for root in &result.roots {
            output.push_str(&self.format_root(root));
            output.push('\n');
        }

        if !result.failures.is_empty() {
            output.push_str(&self.format_failures(result));
            output.push('\n');
        }

        output.push_str(&self.format_footer(result));

        Ok(output)
    }
}

impl TextReporter {
    /// Format the report header.
    fn format_header(&self) -> String {
        let title = "tfmodscan modules";
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));

        if self.use_colors {
            format!(
                "\n{} {}\n{}\n",
                title.bright_white().bold(),
                version.dimmed(),
                "=".repeat(80).bright_blue(),
            )
        } else {
            format!("\n{} {}\n{}\n", title, version, "=".repeat(80))
        }
    }

    /// Format one root: its title, then one table per module.
    fn format_root(&self, root: &ScannedRoot) -> String {
        let mut output = String::new();

        let heading = format!(
            "{} ({} files, {} modules)",
            root.path.display(),
            root.files.len(),
            root.configuration.len()
        );
        if self.use_colors {
            output.push_str(&format!("\n{}\n", heading.bright_cyan().bold()));
        } else {
            output.push_str(&format!("\n{heading}\n"));
        }
        output.push_str(&"-".repeat(80));
        output.push('\n');

        if root.configuration.is_empty() {
            output.push_str("  No module blocks found\n");
            return output;
        }

        for (name, module) in &root.configuration.modules {
            output.push_str(&self.format_module(name, module));
            output.push('\n');
        }

        output
    }

    fn format_module(&self, name: &str, module: &Module) -> String {
        let source = if module.source_path.is_empty() {
            "(no source)"
        } else {
            module.source_path.as_str()
        };

        let title = if self.use_colors {
            format!("module {} <- {}", name.bold(), source.green())
        } else {
            format!("module {name} <- {source}")
        };

        if module.parameters.is_empty() && module.providers.is_empty() {
            return format!("{title}\n");
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            self.header_cell("Kind"),
            self.header_cell("Name"),
            self.header_cell("Value"),
        ]);

        for (key, value) in &module.parameters {
            table.add_row(vec![Cell::new("parameter"), Cell::new(key), Cell::new(value)]);
        }
        for (alias, reference) in &module.providers {
            let kind = if self.use_colors {
                Cell::new("provider").fg(Color::Magenta)
            } else {
                Cell::new("provider")
            };
            table.add_row(vec![kind, Cell::new(alias), Cell::new(reference)]);
        }

        format!("{title}\n{table}\n")
    }

    fn header_cell(&self, text: &str) -> Cell {
        if self.use_colors {
            Cell::new(text).fg(Color::Cyan)
        } else {
            Cell::new(text)
        }
    }

    fn format_failures(&self, result: &ScanResult) -> String {
        let title = if self.use_colors {
            "Failures".red().bold().to_string()
        } else {
            "Failures".to_string()
        };

        let mut output = format!("\n{title}\n{}\n", "-".repeat(80));
        for failure in &result.failures {
            output.push_str(&format!("  {}: {}\n", failure.path.display(), failure.message));
        }
        output
    }

    fn format_footer(&self, result: &ScanResult) -> String {
        let summary = format!(
            "{} modules in {} files across {} paths",
            result.module_count(),
            result.file_count(),
            result.roots.len()
        );
        if self.use_colors {
            format!("{}\n", summary.dimmed())
        } else {
            format!("{summary}\n")
        }
    }
}
