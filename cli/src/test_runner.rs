//! Runner for `.test.md` files: TOML frontmatter stating expectations,
//! followed by the quest script under test.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use qdl::{Categorized, Severity};
use qdl_render::{render_outline, render_xml};

use crate::config::Format;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub format: Format,

    /// Substrings the rendered document must contain.
    #[serde(default)]
    pub expect_output: Vec<String>,

    /// Codes of all non-info diagnostics: warnings first, then errors, then
    /// internal ones, each in emission order.
    #[serde(default)]
    pub expect_codes: Option<Vec<u16>>,

    /// Diagnostic counts keyed by severity name. Severities left out are
    /// not checked.
    #[serde(default)]
    pub expect_counts: Option<BTreeMap<String, usize>>,
}

/// Split a `.test.md` file into its config and quest source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;
    let frontmatter = after_open[..close_pos].trim_end_matches('\r');

    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(frontmatter).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("?")
        })
    }
}

/// Compile `source` and return the document text with its diagnostics.
fn compile(source: &str, format: Format) -> (String, Categorized) {
    match format {
        Format::Xml => {
            let mut compiler = render_xml(source);
            let output = compiler.result().map(ToString::to_string).unwrap_or_default();
            (output, compiler.take_diagnostics().unwrap_or_default())
        }
        Format::Outline => {
            let mut compiler = render_outline(source);
            let output = compiler.result().map(ToString::to_string).unwrap_or_default();
            (output, compiler.take_diagnostics().unwrap_or_default())
        }
    }
}

/// Compare against the expectations. `Some(reason)` on the first mismatch.
fn check(config: &TestConfig, output: &str, diagnostics: &Categorized) -> Option<String> {
    for expected in &config.expect_output {
        if !output.contains(expected.as_str()) {
            return Some(format!(
                "output does not contain \"{}\"\n  actual output:\n{}",
                expected,
                indent(output)
            ));
        }
    }

    if let Some(expected) = &config.expect_codes {
        let actual: Vec<u16> = diagnostics
            .iter()
            .filter(|d| d.severity != Severity::Info)
            .map(|d| d.code.0)
            .collect();
        if &actual != expected {
            let messages: Vec<String> = diagnostics.iter().map(|d| format!("  - {}", d)).collect();
            return Some(format!(
                "expected codes {:?}, got {:?}\n  diagnostics:\n{}",
                expected,
                actual,
                if messages.is_empty() {
                    "    (none)".to_string()
                } else {
                    messages.join("\n")
                }
            ));
        }
    }

    if let Some(expected) = &config.expect_counts {
        for (name, &count) in expected {
            let severity = match name.parse::<Severity>() {
                Ok(severity) => severity,
                Err(unknown) => return Some(unknown.to_diagnostic().to_string()),
            };
            let actual = diagnostics.bucket(severity).len();
            if actual != count {
                return Some(format!(
                    "expected {} {} diagnostic(s), got {}",
                    count, severity, actual
                ));
            }
        }
    }

    None
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    debug!("running {} as {:?}", path.display(), config.format);
    let (output, diagnostics) = compile(source, config.format);

    match check(&config, &output, &diagnostics) {
        Some(reason) => fail(config.description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description: config.description,
            outcome: TestOutcome::Pass,
        },
    }
}

/// Discover `.test.md` files grouped by category, the subfolder relative to
/// `root`. Files directly in `root` get category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".test.md"));
        if is_test {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// ANSI styling that turns into plain text with `--no-color`.
struct Style {
    no_color: bool,
}

impl Style {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }

    fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }
}

/// Select the categories to run. Requested names match a category and all
/// of its subcategories.
fn select<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }

    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let prefix = format!("{}/", request);
        let before = selected.len();
        for (category, files) in all {
            if category == request || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

/// Run all `.test.md` files under `path`, or the single file `path`.
/// Returns the process exit code: 0 when everything passed.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { no_color };

    let all = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        discover_categorized(path)
    };
    if all.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return 1;
    }

    let selected = select(&all, categories);
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();
    for (category, files) in &selected {
        eprintln!();
        eprintln!("{}", style.bold(category_label(category)));
        for file in *files {
            let result = run_single_test(file);
            match result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", style.pass(), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", style.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", style.paint("32", "ok"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("31", "FAILED"),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn frontmatter_and_source_are_split() {
        let (config, source) = parse_test_file(
            "---\ndescription = \"combat\"\nformat = \"outline\"\nexpect_codes = [430]\n---\n# Q\n",
        )
        .unwrap();
        assert_eq!(config.description.as_deref(), Some("combat"));
        assert_eq!(config.format, Format::Outline);
        assert_eq!(config.expect_codes, Some(vec![430]));
        assert_eq!(source, "# Q\n");
    }

    #[test]
    fn missing_delimiters_are_reported() {
        assert!(parse_test_file("# Q\n").is_err());
        assert!(parse_test_file("---\ndescription = \"x\"\n# Q\n").is_err());
    }

    #[test]
    fn unknown_frontmatter_key_is_reported() {
        let err = parse_test_file("---\nexpect_colour = 1\n---\n").err().unwrap();
        assert!(err.starts_with("TOML parse error"), "{}", err);
    }

    #[test]
    fn checks_output_codes_and_counts() {
        let config = TestConfig {
            expect_output: vec!["<combat/>".to_string()],
            expect_codes: Some(vec![430]),
            expect_counts: Some(BTreeMap::from([
                ("error".to_string(), 1),
                ("warning".to_string(), 0),
            ])),
            ..TestConfig::default()
        };
        let (output, diagnostics) = compile("# Q\n\n_combat_\n", Format::Xml);
        assert_eq!(check(&config, &output, &diagnostics), None);
    }

    #[test]
    fn mismatched_codes_fail() {
        let config = TestConfig {
            expect_codes: Some(vec![]),
            ..TestConfig::default()
        };
        let (output, diagnostics) = compile("No quest header.\n", Format::Outline);
        let reason = check(&config, &output, &diagnostics).unwrap();
        assert!(reason.starts_with("expected codes [], got [425]"), "{}", reason);
    }

    #[test]
    fn unknown_severity_name_is_reported_as_506() {
        let config = TestConfig {
            expect_counts: Some(BTreeMap::from([("fatal".to_string(), 1)])),
            ..TestConfig::default()
        };
        let (output, diagnostics) = compile("# Q\n", Format::Xml);
        let reason = check(&config, &output, &diagnostics).unwrap();
        assert_eq!(reason, "internal[506]: unknown message type \"fatal\"");
    }

    #[test]
    fn runs_a_directory_of_tests() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("basics")).unwrap();
        std::fs::write(
            dir.path().join("basics/trigger.test.md"),
            "---\nformat = \"outline\"\nexpect_output = [\"trigger: end\"]\n---\n# Q\n\n**end**\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.md"), "not a test").unwrap();

        let categories = discover_categorized(dir.path());
        assert_eq!(categories.keys().collect::<Vec<_>>(), vec!["basics"]);
        assert_eq!(run_tests(dir.path(), true, &[]), 0);
        assert_eq!(run_tests(dir.path(), true, &["missing".to_string()]), 1);
    }

    #[test]
    fn failing_test_sets_exit_code() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wrong.test.md");
        std::fs::write(&path, "---\nexpect_output = [\"<combat\"]\n---\n# Q\n").unwrap();
        assert_eq!(run_tests(&path, true, &[]), 1);
    }
}
