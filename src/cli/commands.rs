//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::{Path, PathBuf};

use kpl_syntax::diagnostics::{self, Diagnostic};
use kpl_syntax::{ParserConfig, lexer, parse_with_config};

use super::{CliError, CliResult, ExitCode};
use crate::format::{format_diff, format_source};

/// Maximum source file size (100 MB)
///
/// Files larger than this are rejected to prevent out-of-memory conditions
/// while lexing.
const MAX_SOURCE_SIZE: u64 = 100 * 1024 * 1024;

/// Extension of KPL source files picked up by `fmt`.
const SOURCE_EXTENSION: &str = "kpl";

/// Read source file contents.
///
/// ## Errors
///
/// Returns an error if:
/// - The file cannot be read (I/O error)
/// - The file exceeds `MAX_SOURCE_SIZE` (100 MB)
pub fn read_source(file_path: &str) -> CliResult<String> {
    // Check file size before reading
    let metadata =
        fs::metadata(file_path).map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", file_path, e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "Source file '{}' is too large ({} bytes, max {} bytes)",
            file_path,
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read_to_string(file_path).map_err(|e| CliError::failure(format!("Error reading file '{}': {}", file_path, e)))
}

/// Render every diagnostic against the source, separated by blank lines.
fn render_all(file_path: &str, source: &str, diagnostics: &[Diagnostic]) -> String {
    let mut msg = String::new();
    for diagnostic in diagnostics {
        msg.push_str(&diagnostics::render(file_path, source, diagnostic));
        msg.push('\n');
    }
    msg
}

/// Split diagnostics into a failure (any errors) or printed warnings.
fn report(file_path: &str, source: &str, found: &[Diagnostic]) -> CliResult<()> {
    if diagnostics::has_errors(found) {
        return Err(CliError::failure(render_all(file_path, source, found).trim_end()));
    }
    if !found.is_empty() {
        eprint!("{}", render_all(file_path, source, found));
    }
    Ok(())
}

/// Lex and display tokens.
pub fn lex_file(file_path: &str) -> CliResult<ExitCode> {
    let source = read_source(file_path)?;
    let (tokens, errors) = lexer::tokenize(&source);

    for tok in &tokens {
        println!("{:?}", tok);
    }
    report(file_path, &source, &errors)?;
    Ok(ExitCode::SUCCESS)
}

/// Parse and display the syntax tree, partial or not.
pub fn parse_file(file_path: &str, config: &ParserConfig) -> CliResult<ExitCode> {
    let source = read_source(file_path)?;
    let (unit, found) = parse_with_config(&source, config);

    println!("{:#?}", unit);
    report(file_path, &source, &found)?;
    Ok(ExitCode::SUCCESS)
}

/// Check a file for lexical, syntactic, and structural errors.
pub fn check_file(file_path: &str, config: &ParserConfig) -> CliResult<ExitCode> {
    let source = read_source(file_path)?;
    let (unit, found) = parse_with_config(&source, config);
    report(file_path, &source, &found)?;

    tracing::debug!(declarations = unit.declarations().len(), "parsed {}", file_path);
    let warnings = found.len();
    if warnings == 0 {
        println!("✓ {}: no syntax errors", file_path);
    } else {
        println!("✓ {}: no syntax errors, {} warning(s)", file_path, warnings);
    }
    Ok(ExitCode::SUCCESS)
}

/// Format KPL source files.
pub fn format_files(path: &str, check_mode: bool, diff_mode: bool) -> CliResult<ExitCode> {
    let path = Path::new(path);
    let files = collect_source_files(path);

    if files.is_empty() {
        return Err(CliError::failure(format!("No .{} files found", SOURCE_EXTENSION)));
    }

    let mut needs_formatting = false;
    let mut formatted_count = 0;
    let mut error_count = 0;

    for file_path in &files {
        let source = match fs::read_to_string(file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading {}: {}", file_path.display(), e);
                error_count += 1;
                continue;
            }
        };

        match format_source(&source) {
            Ok(formatted) => {
                let changed = source != formatted;

                if diff_mode && changed {
                    println!("--- {}", file_path.display());
                    if let Ok(Some(diff)) = format_diff(&source) {
                        print!("{}", diff);
                    }
                    println!();
                }

                if check_mode {
                    if changed {
                        println!("Would reformat: {}", file_path.display());
                        needs_formatting = true;
                    }
                } else if diff_mode {
                    if changed {
                        needs_formatting = true;
                    }
                } else if changed {
                    if let Err(e) = fs::write(file_path, &formatted) {
                        eprintln!("Error writing {}: {}", file_path.display(), e);
                        error_count += 1;
                    } else {
                        println!("Formatted: {}", file_path.display());
                        formatted_count += 1;
                    }
                }
            }
            Err(e) => {
                eprintln!("Error formatting {}: {}", file_path.display(), e);
                error_count += 1;
            }
        }
    }

    if check_mode || diff_mode {
        if needs_formatting {
            let msg = if diff_mode {
                "need formatting"
            } else {
                "would be reformatted"
            };
            return Err(CliError::failure(format!("\n{} file(s) {}", files.len(), msg)));
        } else {
            println!("✓ {} file(s) already formatted", files.len());
        }
    } else {
        println!("\n✓ {} file(s) formatted, {} error(s)", formatted_count, error_count);
    }

    if error_count > 0 {
        return Err(CliError::new("", ExitCode::FAILURE));
    }

    Ok(ExitCode::SUCCESS)
}

fn is_source_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Collect `.kpl` files under `path`, skipping hidden and build directories.
fn collect_source_files(path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if path.is_file() {
        if is_source_file(path) {
            files.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        if let Ok(entries) = fs::read_dir(path) {
            for entry in entries.flatten() {
                let entry_path = entry.path();
                if entry_path.is_dir() {
                    let name = entry_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                    if !name.starts_with('.') && name != "target" {
                        files.extend(collect_source_files(&entry_path));
                    }
                } else if is_source_file(&entry_path) {
                    files.push(entry_path);
                }
            }
        }
    }

    files.sort();
    files
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kpl_cli_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_read_source_missing_file() {
        let err = read_source("/definitely/not/here.kpl").unwrap_err();
        assert!(err.message.contains("Cannot access file"));
        assert_eq!(err.exit_code, ExitCode::FAILURE);
    }

    #[test]
    fn test_collect_source_files_skips_hidden_and_foreign() {
        let dir = scratch_dir("collect");
        fs::write(dir.join("a.kpl"), "code A endCode").unwrap();
        fs::write(dir.join("notes.txt"), "not source").unwrap();
        fs::create_dir_all(dir.join(".hidden")).unwrap();
        fs::write(dir.join(".hidden").join("b.kpl"), "code B endCode").unwrap();
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested").join("c.kpl"), "code C endCode").unwrap();

        let files = collect_source_files(&dir);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.kpl", "c.kpl"]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_check_file_reports_errors() {
        let dir = scratch_dir("check");
        let file = dir.join("broken.kpl");
        fs::write(&file, "code Broken function f( endCode").unwrap();
        let err = check_file(&file.to_string_lossy(), &ParserConfig::default()).unwrap_err();
        assert!(err.message.contains("kpl::syntax"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_format_files_check_mode_does_not_write() {
        let dir = scratch_dir("fmt_check");
        let file = dir.join("messy.kpl");
        fs::write(&file, "code   Messy endCode").unwrap();
        assert!(format_files(&file.to_string_lossy(), true, false).is_err());
        assert_eq!(fs::read_to_string(&file).unwrap(), "code   Messy endCode");

        assert!(format_files(&file.to_string_lossy(), false, false).is_ok());
        assert_eq!(fs::read_to_string(&file).unwrap(), "code Messy\nendCode\n");
        let _ = fs::remove_dir_all(&dir);
    }
}
