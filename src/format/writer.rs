//! Output writer with indentation tracking
//!
//! Handles writing formatted code with proper indentation.

use super::config::FormatConfig;

/// Writer that tracks indentation and builds formatted output
pub struct FormatWriter {
    /// The output buffer
    output: String,
    /// Current indentation level
    indent_level: usize,
    /// Configuration
    config: FormatConfig,
    /// Whether we're at the start of a line
    at_line_start: bool,
}

impl FormatWriter {
    /// Create a new format writer with the given config
    pub fn new(config: FormatConfig) -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            config,
            at_line_start: true,
        }
    }

    /// Get the formatted output
    pub fn finish(self) -> String {
        self.output
    }

    /// Increase indentation level
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    /// Decrease indentation level
    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Write indentation if at line start
    fn write_indent(&mut self) {
        if self.at_line_start {
            let width = self.indent_level * self.config.indent_width;
            self.output.extend(std::iter::repeat_n(' ', width));
            self.at_line_start = false;
        }
    }

    /// Write a string (with auto-indent)
    pub fn write(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.write_indent();
        self.output.push_str(s);
    }

    /// Write a string and newline
    pub fn writeln(&mut self, s: &str) {
        self.write(s);
        self.newline();
    }

    /// End the current line; a no-op when nothing has been written on it yet.
    pub fn newline(&mut self) {
        if self.at_line_start {
            return;
        }
        self.output.push('\n');
        self.at_line_start = true;
    }

    /// Write blank lines (for spacing between declarations)
    pub fn blank_lines(&mut self, count: usize) {
        self.newline();
        for _ in 0..count {
            self.output.push('\n');
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &FormatConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_writer() -> FormatWriter {
        FormatWriter::new(FormatConfig::default())
    }

    #[test]
    fn test_new_writer_empty_output() {
        let writer = default_writer();
        assert_eq!(writer.finish(), "");
    }

    #[test]
    fn test_write_multiple() {
        let mut writer = default_writer();
        writer.write("hello");
        writer.write(" ");
        writer.write("world");
        assert_eq!(writer.finish(), "hello world");
    }

    #[test]
    fn test_indent_applies_at_line_start_only() {
        let mut writer = default_writer();
        writer.writeln("while x");
        writer.indent();
        writer.write("debug");
        writer.write(" -- still same line");
        writer.newline();
        writer.dedent();
        writer.writeln("endWhile");
        assert_eq!(writer.finish(), "while x\n    debug -- still same line\nendWhile\n");
    }

    #[test]
    fn test_custom_indent_width() {
        let mut writer = FormatWriter::new(FormatConfig::new().with_indent_width(2));
        assert_eq!(writer.config().indent_width, 2);
        writer.indent();
        writer.indent();
        writer.writeln("x");
        assert_eq!(writer.finish(), "    x\n");
    }

    #[test]
    fn test_dedent_saturates_at_zero() {
        let mut writer = default_writer();
        writer.dedent();
        writer.writeln("x");
        assert_eq!(writer.finish(), "x\n");
    }

    #[test]
    fn test_newline_does_not_stack() {
        let mut writer = default_writer();
        writer.writeln("a");
        writer.newline();
        writer.writeln("b");
        assert_eq!(writer.finish(), "a\nb\n");
    }

    #[test]
    fn test_blank_lines() {
        let mut writer = default_writer();
        writer.write("a");
        writer.blank_lines(2);
        writer.writeln("b");
        assert_eq!(writer.finish(), "a\n\n\nb\n");
    }
}
