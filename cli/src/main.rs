mod config;
mod report;
mod test_runner;

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use log::{LevelFilter, info};

use qdl::{Compiler, Renderer};
use qdl_render::{render_outline, render_xml};

use config::{Config, Format};
use report::Reporter;

const SUBCOMMANDS: &[&str] = &["compile", "test", "help"];
/// Global options that take a value, so the value is not mistaken for a file.
const VALUE_OPTIONS: &[&str] = &["--config"];

#[derive(Parser)]
#[command(name = "qdl", version, about = "Quest script compiler")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log more; repeat for debug and trace output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (default: ./qdl.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a quest script
    Compile(CompileArgs),

    /// Run .test.md test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Quest script to compile
    file: String,

    /// Output format (overrides the config file)
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Print only the card containing this 1-based source line
    #[arg(long, value_name = "LINE")]
    at: Option<usize>,

    /// Print the quest metadata as TOML instead of the document
    #[arg(long)]
    meta: bool,

    /// Report diagnostics only, print nothing
    #[arg(long)]
    check: bool,

    /// Exit non-zero on warnings too
    #[arg(long)]
    deny_warnings: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

/// Make `qdl file.md` mean `qdl compile file.md`.
fn inject_compile(mut args: Vec<String>) -> Vec<String> {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        if VALUE_OPTIONS.contains(&arg) {
            i += 2;
            continue;
        }
        if arg.starts_with('-') {
            i += 1;
            continue;
        }
        if !SUBCOMMANDS.contains(&arg) {
            args.insert(i, "compile".to_string());
        }
        break;
    }
    args
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse_from(inject_compile(std::env::args().collect()));
    init_logging(cli.verbose);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    info!("using {:?}", config);

    match cli.command {
        Command::Compile(args) => process::exit(do_compile(args, &config, cli.no_color)),
        Command::Test(args) => {
            let path = Path::new(&args.path);
            if args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            process::exit(test_runner::run_tests(path, cli.no_color, &args.category));
        }
    }
}

fn do_compile(args: CompileArgs, config: &Config, no_color: bool) -> i32 {
    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            return 1;
        }
    };

    let format = args.format.unwrap_or(config.format);
    info!("compiling {} as {:?}", args.file, format);
    match format {
        Format::Xml => finish(render_xml(&source), &source, &args, config, no_color),
        Format::Outline => finish(render_outline(&source), &source, &args, config, no_color),
    }
}

/// Print what was asked for, report diagnostics, and pick the exit code.
fn finish<R>(
    mut compiler: Compiler<R>,
    source: &str,
    args: &CompileArgs,
    config: &Config,
    no_color: bool,
) -> i32
where
    R: Renderer,
    R::Value: Display,
    R::Document: Display,
{
    let output = if args.check {
        None
    } else if args.meta {
        match toml::to_string(&compiler.meta()) {
            Ok(meta) => Some(meta),
            Err(e) => {
                eprintln!("error: cannot write metadata: {}", e);
                return 1;
            }
        }
    } else if let Some(line) = args.at {
        match compiler.result_at(line.saturating_sub(1)) {
            Some(value) => Some(value.to_string()),
            None => {
                eprintln!("error: no card at line {}", line);
                return 1;
            }
        }
    } else {
        compiler.result().map(ToString::to_string)
    };

    if let Some(output) = output {
        match &args.out {
            Some(path) => {
                if let Err(e) = std::fs::write(path, output) {
                    eprintln!("error: cannot write '{}': {}", path.display(), e);
                    return 1;
                }
            }
            None => print!("{}", output),
        }
    }

    let diagnostics = compiler.take_diagnostics().unwrap_or_default();
    let reporter = Reporter::new(&args.file, source, no_color, config.show_internal);
    if reporter.emit_all(compiler.blocks(), &diagnostics) > 0 {
        eprintln!("{}: {}", args.file, report::summary(&diagnostics, config.show_internal));
    }

    let deny_warnings = args.deny_warnings || config.deny_warnings;
    let failed = !diagnostics.error.is_empty()
        || (config.show_internal && !diagnostics.internal.is_empty())
        || (deny_warnings && !diagnostics.warning.is_empty());
    if failed { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_file_means_compile() {
        assert_eq!(
            inject_compile(args(&["qdl", "quest.md"])),
            args(&["qdl", "compile", "quest.md"])
        );
        assert_eq!(
            inject_compile(args(&["qdl", "--no-color", "quest.md", "--meta"])),
            args(&["qdl", "--no-color", "compile", "quest.md", "--meta"])
        );
    }

    #[test]
    fn subcommands_are_left_alone() {
        assert_eq!(
            inject_compile(args(&["qdl", "test", "tests/quests"])),
            args(&["qdl", "test", "tests/quests"])
        );
        assert_eq!(inject_compile(args(&["qdl", "--help"])), args(&["qdl", "--help"]));
    }

    #[test]
    fn config_value_is_not_a_file() {
        assert_eq!(
            inject_compile(args(&["qdl", "--config", "my.toml", "quest.md"])),
            args(&["qdl", "--config", "my.toml", "compile", "quest.md"])
        );
    }

    #[test]
    fn cli_parses_compile_flags() {
        let cli = Cli::parse_from(inject_compile(args(&[
            "qdl",
            "quest.md",
            "--format",
            "outline",
            "--at",
            "12",
            "-vv",
        ])));
        assert_eq!(cli.verbose, 2);
        let Command::Compile(compile) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(compile.file, "quest.md");
        assert_eq!(compile.format, Some(Format::Outline));
        assert_eq!(compile.at, Some(12));
    }
}
