use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{ArgAction, Parser};
use console::style;
use kousei_core::{
    extract_context, filter_diagnostics, rule_listing, Document, LintResult, RuleConfiguration,
    RuleEngine, SeverityFilter,
};
use serde::Serialize;
use walkdir::WalkDir;

/// Kousei CLI entry point.
#[derive(Debug, Parser)]
#[command(name = "kousei", about = "Lint Japanese prose for style problems.")]
struct Args {
    /// Path to config file (YAML). Defaults to kousei.yml if present.
    #[arg(long, default_value = "kousei.yml")]
    config: PathBuf,

    /// Emit JSON output for automation / editor usage.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Strict mode: exit non-zero on warnings as well as errors.
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,

    /// Suppress per-file diagnostic output.
    #[arg(long, action = ArgAction::SetTrue)]
    quiet: bool,

    /// Files or directories to lint.
    #[arg(value_name = "PATH", default_value = ".", num_args = 0..)]
    paths: Vec<PathBuf>,

    /// Keep only diagnostics of this severity.
    #[arg(long, value_enum, default_value = "all", value_name = "LEVEL")]
    severity: SeverityArg,

    /// Enable rules by id (comma-separated). Overrides the config file.
    #[arg(long, value_delimiter = ',', value_name = "RULE[,RULE]")]
    enable: Vec<String>,

    /// Disable rules by id (comma-separated). Overrides the config file.
    #[arg(long, value_delimiter = ',', value_name = "RULE[,RULE]")]
    disable: Vec<String>,

    /// List every registered rule with its enabled state and exit.
    #[arg(long, action = ArgAction::SetTrue)]
    rules: bool,

    /// Characters of surrounding context to show with each diagnostic.
    #[arg(long, default_value_t = 20, value_name = "CHARS")]
    context: usize,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SeverityArg {
    All,
    Error,
    Warning,
}

impl From<SeverityArg> for SeverityFilter {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::All => SeverityFilter::All,
            SeverityArg::Error => SeverityFilter::Error,
            SeverityArg::Warning => SeverityFilter::Warning,
        }
    }
}

#[derive(Debug, Serialize)]
struct FileResult {
    path: String,
    #[serde(flatten)]
    result: LintResult,
}

#[derive(Debug, Serialize)]
struct OutputReport {
    files: Vec<FileResult>,
    total_errors: usize,
    total_warnings: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    run_lint(args)
}

fn run_lint(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(&args.config)?;
    for id in &args.disable {
        config.disable(id.trim());
    }
    for id in &args.enable {
        config.enable(id.trim());
    }

    if args.rules {
        print_rule_listing(&config, args.json)?;
        return Ok(());
    }

    let engine = RuleEngine::new();
    let severity = SeverityFilter::from(args.severity);

    // "-" reads the document from stdin; everything else goes through walkdir.
    let mut sources: Vec<(String, String)> = Vec::new();
    if args.paths.iter().any(|p| p.as_os_str() == "-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        sources.push(("<stdin>".to_string(), content));
    }
    let walk_paths: Vec<PathBuf> = args
        .paths
        .iter()
        .filter(|p| p.as_os_str() != "-")
        .cloned()
        .collect();
    let mut files = collect_files(&walk_paths)?;
    files.sort();
    for path in files {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        sources.push((path.to_string_lossy().replace('\\', "/"), content));
    }

    let mut file_results = Vec::new();
    let mut total_errors = 0usize;
    let mut total_warnings = 0usize;

    for (path, content) in sources {
        let result = filter_diagnostics(&engine.lint(&content).messages, &config, severity);
        total_errors += result.error_count;
        total_warnings += result.warning_count;

        if !args.quiet && !args.json {
            print_human_report(&path, &content, &result, args.context);
        }

        file_results.push(FileResult { path, result });
    }

    let output = OutputReport {
        files: file_results,
        total_errors,
        total_warnings,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !args.quiet {
        println!(
            "\n{} files, {} errors, {} warnings",
            output.files.len(),
            total_errors,
            total_warnings
        );
    }

    if total_errors > 0 || (args.strict && total_warnings > 0) {
        std::process::exit(1);
    }

    Ok(())
}

fn collect_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path) {
                let entry = entry?;
                if entry.file_type().is_file() && is_supported(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if path.is_file() {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn is_supported(path: &Path) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "md" | "markdown" | "mdx" | "txt" | "rst"
        ),
        None => false,
    }
}

fn load_config(path: &PathBuf) -> anyhow::Result<RuleConfiguration> {
    if path.exists() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: RuleConfiguration = serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid config structure in {}", path.display()))?;
        Ok(config)
    } else {
        Ok(RuleConfiguration::default())
    }
}

fn print_rule_listing(config: &RuleConfiguration, json: bool) -> anyhow::Result<()> {
    let listing = rule_listing(config);
    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }
    for rule in listing {
        let state = if rule.enabled {
            style("on ").green()
        } else {
            style("off").red()
        };
        println!("  {} [{}] {}: {}", state, rule.category, rule.id, rule.name);
    }
    Ok(())
}

fn print_human_report(path: &str, content: &str, result: &LintResult, context_len: usize) {
    println!(
        "{} ({} errors, {} warnings)",
        style(path).bold(),
        result.error_count,
        result.warning_count
    );
    if result.messages.is_empty() {
        println!("  {}", style("clean").green());
        return;
    }
    let document = Document::new(content);
    for diag in &result.messages {
        println!(
            "  [{}] {}:{} {}",
            style(&diag.rule_id).yellow(),
            diag.line,
            diag.column,
            diag.message
        );
        if let Some(snippet) = extract_context(&document, diag.line, diag.column, context_len) {
            println!(
                "      → {}{}{}",
                snippet.before,
                style(&snippet.error_text).red(),
                snippet.after
            );
        }
    }
}
