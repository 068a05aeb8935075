//! Formatting configuration for KPL
//!
//! The defaults produce the canonical layout: 4-space indentation, one blank line between top-level declarations
//! and between behavior methods.

/// Formatting configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatConfig {
    /// Number of spaces per indentation level
    pub indent_width: usize,
    /// Number of blank lines between top-level declarations
    pub blank_lines_top_level: usize,
    /// Number of blank lines between methods of a behavior
    pub blank_lines_members: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            blank_lines_top_level: 1,
            blank_lines_members: 1,
        }
    }
}

impl FormatConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indentation width
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Set the blank lines between top-level declarations
    pub fn with_blank_lines_top_level(mut self, count: usize) -> Self {
        self.blank_lines_top_level = count;
        self
    }

    /// Set the blank lines between behavior methods
    pub fn with_blank_lines_members(mut self, count: usize) -> Self {
        self.blank_lines_members = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FormatConfig::default();
        assert_eq!(config.indent_width, 4);
        assert_eq!(config.blank_lines_top_level, 1);
        assert_eq!(config.blank_lines_members, 1);
    }

    #[test]
    fn test_new_equals_default() {
        assert_eq!(FormatConfig::new(), FormatConfig::default());
    }

    #[test]
    fn test_builder_chain() {
        let config = FormatConfig::new()
            .with_indent_width(2)
            .with_blank_lines_top_level(2)
            .with_blank_lines_members(0);
        assert_eq!(config.indent_width, 2);
        assert_eq!(config.blank_lines_top_level, 2);
        assert_eq!(config.blank_lines_members, 0);
    }

    #[test]
    fn test_with_indent_width_zero() {
        let config = FormatConfig::new().with_indent_width(0);
        assert_eq!(config.indent_width, 0);
        // Other fields unchanged
        assert_eq!(config.blank_lines_top_level, 1);
    }
}
