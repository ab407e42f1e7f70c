use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use mender_core::{MenderConfig, OutputFormat};
use mender_pipeline::{derive_local_path, Pipeline, RunOptions};
use mender_publish::host::GhCli;

#[derive(Parser)]
#[command(
    name = "mender",
    version,
    about = "Automated remediation of static-analysis findings",
    long_about = "Mender closes the loop between a static-analysis scanner and your review queue:\n\
                   it clones a repository, runs the scanner, asks an LLM to fix each flagged file,\n\
                   and publishes every fix as its own branch and review request.\n\n\
                   Examples:\n  \
                     mender run --repo https://github.com/owner/app.git   Full remediation run\n  \
                     mender run --repo ... --dry-run                      Fix locally, publish nothing\n  \
                     mender run --repo ... --base-branch develop          Fork fixes from develop\n  \
                     mender report scan-report.json                       Inspect an analysis report\n  \
                     mender doctor                                        Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .mender.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full remediation pipeline against a repository
    #[command(long_about = "Run the full remediation pipeline against a repository.\n\n\
        Clones the repository, runs the configured scanner, aggregates its JSON report,\n\
        submits each flagged file to the LLM, and publishes every resulting change as a\n\
        single-file branch plus review request.\n\n\
        Examples:\n  mender run --repo https://github.com/owner/app.git\n  \
        mender run --repo git@github.com:owner/app.git --path /tmp/app --dry-run")]
    Run {
        /// Repository to remediate (anything `git clone` accepts)
        #[arg(long)]
        repo: String,

        /// Working-copy destination (default: <repo name>_clone)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Branch fixes fork from and review requests target (overrides config)
        #[arg(long)]
        base_branch: Option<String>,

        /// Code-host token for authentication
        #[arg(
            long,
            long_help = "Code-host token used if no session exists.\n\nFalls back to the GH_TOKEN environment variable. The token is passed\nto the host CLI via stdin and never appears in a process listing."
        )]
        token: Option<String>,

        /// Remediate locally but skip branch pushes and review requests
        #[arg(long)]
        dry_run: bool,

        /// Allow an interactive code-host login if token auth fails
        #[arg(long)]
        interactive: bool,
    },
    /// Aggregate and display a scanner report without remediating
    #[command(long_about = "Aggregate and display a scanner report without remediating.\n\n\
        Parses the JSON report, groups findings per file in report order, and prints\n\
        the result. Useful for checking what a run would consider before spending\n\
        model tokens.\n\n\
        Examples:\n  mender report scan-report.json\n  mender report scan-report.json --format json")]
    Report {
        /// Path to the scanner's JSON report
        file: PathBuf,
    },
    /// Create a default .mender.toml configuration file
    #[command(long_about = "Create a default .mender.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .mender.toml already exists.")]
    Init,
    /// Check your Mender setup and environment
    #[command(long_about = "Check your Mender setup and environment.\n\n\
        Runs diagnostics for the git and gh binaries, the config file, the LLM API\n\
        key, and the code-host token. Use --format json for machine-readable output.")]
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[33m⚒\x1b[0m \x1b[1mmender\x1b[0m v{version} — scan, fix, and publish every finding for review\n");

        println!("Quick start:");
        println!("  \x1b[36mmender init\x1b[0m                   Create a .mender.toml config file");
        println!("  \x1b[36mmender run --repo <url>\x1b[0m       Remediate a repository end to end");
        println!("  \x1b[36mmender doctor\x1b[0m                 Check your setup\n");

        println!("All commands:");
        println!("  \x1b[32mrun\x1b[0m       Clone, scan, fix with an LLM, publish per-file review requests");
        println!("  \x1b[32mreport\x1b[0m    Aggregate and display a scanner report");
        println!("  \x1b[32mdoctor\x1b[0m    Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("mender v{version} — scan, fix, and publish every finding for review\n");

        println!("Quick start:");
        println!("  mender init                   Create a .mender.toml config file");
        println!("  mender run --repo <url>       Remediate a repository end to end");
        println!("  mender doctor                 Check your setup\n");

        println!("All commands:");
        println!("  run       Clone, scan, fix with an LLM, publish per-file review requests");
        println!("  report    Aggregate and display a scanner report");
        println!("  doctor    Check your setup and environment");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'mender <command> --help' for details.");
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn binary_version(program: &str) -> Option<String> {
    let output = std::process::Command::new(program)
        .arg("--version")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
}

fn run_doctor(config: &MenderConfig, format: OutputFormat, use_color: bool) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();

    // 1. git binary
    match binary_version("git") {
        Some(version) => checks.push(CheckResult::pass("git_binary", version)),
        None => checks.push(CheckResult::fail(
            "git_binary",
            "git not found on PATH",
            "install git; every clone, branch, and push goes through it",
        )),
    }

    // 2. gh binary
    match binary_version("gh") {
        Some(version) => checks.push(CheckResult::pass("gh_binary", version)),
        None => checks.push(CheckResult::fail(
            "gh_binary",
            "gh not found on PATH",
            "install the GitHub CLI; review requests are opened through it",
        )),
    }

    // 3. Config file
    if std::path::Path::new(".mender.toml").exists() {
        checks.push(CheckResult::pass("config_file", ".mender.toml found"));
    } else {
        checks.push(CheckResult::fail(
            "config_file",
            ".mender.toml not found",
            "run 'mender init' to create a default config",
        ));
    }

    // 4. LLM provider + API key
    checks.push(CheckResult::pass(
        "llm_provider",
        format!("{} (model: {})", config.llm.provider, config.llm.model),
    ));
    if config.llm.api_key.is_some() || std::env::var("OPENAI_API_KEY").is_ok() {
        checks.push(CheckResult::pass("llm_api_key", "OPENAI_API_KEY set"));
    } else {
        checks.push(CheckResult::fail(
            "llm_api_key",
            "OPENAI_API_KEY not set",
            "export OPENAI_API_KEY=... or set api_key in .mender.toml [llm]",
        ));
    }

    // 5. Code-host token
    if std::env::var("GH_TOKEN").is_ok() {
        checks.push(CheckResult::pass("code_host_token", "GH_TOKEN set"));
    } else {
        checks.push(CheckResult::info(
            "code_host_token",
            "GH_TOKEN not set (an existing gh session or --token also works)",
        ));
    }

    // 6. Scanner
    checks.push(CheckResult::info(
        "scanner",
        format!(
            "{} (report: {})",
            config.scan.program,
            config.scan.report.display()
        ),
    ));

    match format {
        OutputFormat::Json => {
            let version = env!("CARGO_PKG_VERSION");
            let json = serde_json::json!({
                "version": version,
                "checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        _ => {
            let version = env!("CARGO_PKG_VERSION");
            println!("Mender v{version} — Environment Check\n");

            for check in &checks {
                let sym = if use_color {
                    check.colored_symbol()
                } else {
                    check.symbol().to_string()
                };
                let label = check.name.replace('_', " ");
                println!("  {sym} {label:<20} {}", check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }

            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            let info = checks.iter().filter(|c| c.status == "info").count();
            println!("\n{passed} checks passed, {failed} failed, {info} info");
        }
    }

    Ok(())
}

fn print_issue_report(issues: &mender_core::FileIssueSet, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = issues
                .iter()
                .map(|(file, findings)| {
                    serde_json::json!({
                        "fileName": file,
                        "issues": findings,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).into_diagnostic()?
            );
        }
        OutputFormat::Markdown => {
            println!("# Scanner Report\n");
            if issues.is_empty() {
                println!("No files listed.");
            }
            for (file, findings) in issues.iter() {
                println!("## `{file}` ({} findings)\n", findings.len());
                for finding in findings {
                    println!(
                        "- Line {}-{}: {}",
                        finding.start_line, finding.end_line, finding.message
                    );
                }
                println!();
            }
        }
        OutputFormat::Text => {
            if issues.is_empty() {
                println!("No files listed in the report.");
            }
            for (file, findings) in issues.iter() {
                println!("{file} ({} findings)", findings.len());
                for finding in findings {
                    println!(
                        "  line {}-{}: {}",
                        finding.start_line, finding.end_line, finding.message
                    );
                }
            }
        }
    }
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Mender Configuration

[llm]
# OpenAI-compatible chat completions endpoint
# provider = "openai"
# model = "gpt-4o"
# base_url = "https://api.openai.com"
# api_key is read from OPENAI_API_KEY; set it here only in uncommitted local configs

[scan]
# Scanner invocation; args is a structured list, never a shell string
# program = "sonar-scanner"
# args = []
# report = "scan-report.json"

[remedy]
# Language tag requested in the prompt and required during extraction
# fence_tag = "fixed"

[publish]
# base_branch = "main"
# remote = "origin"
# review_body = "This change request updates a single file flagged by static analysis."
# command_timeout_secs = 300
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MenderConfig::from_file(path)?,
        None => {
            let default_path = std::path::Path::new(".mender.toml");
            if default_path.exists() {
                MenderConfig::from_file(default_path)?
            } else {
                MenderConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    if cli.verbose {
        eprintln!("format: {}", cli.format);
        eprintln!(
            "model: {} | scanner: {} | base branch: {}",
            config.llm.model, config.scan.program, config.publish.base_branch,
        );
    }

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Run {
            ref repo,
            ref path,
            ref base_branch,
            ref token,
            dry_run,
            interactive,
        }) => {
            if let Some(branch) = base_branch {
                config.publish.base_branch = branch.clone();
            }
            if config.llm.api_key.is_none() {
                config.llm.api_key = std::env::var("OPENAI_API_KEY").ok();
            }
            if config.llm.api_key.is_none() && config.llm.base_url.is_none() {
                miette::bail!(miette::miette!(
                    help = "Set OPENAI_API_KEY or add api_key in your .mender.toml under [llm]",
                    "No API key configured for LLM provider '{}'",
                    config.llm.provider
                ));
            }

            let opts = RunOptions {
                repo_url: repo.clone(),
                local_path: path.clone(),
                token: token.clone(),
                allow_interactive: interactive,
                dry_run,
            };
            let work = derive_local_path(repo, path.as_deref());
            let timeout =
                std::time::Duration::from_secs(config.publish.command_timeout_secs);
            let host = GhCli::new(&work, timeout);

            let pipeline = Pipeline::new(config);
            let report = pipeline.run(&opts, host).await?;

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => {
                    print!("{}", report.to_markdown());
                }
                OutputFormat::Text => {
                    print!("{report}");
                }
            }

            if cli.verbose {
                eprintln!("--- Run Stats ---");
                eprintln!(
                    "Files: {} considered, {} fixed, {} without issues, {} failed",
                    report.stats.files_considered,
                    report.stats.files_fixed,
                    report.stats.files_without_issues,
                    report.stats.remediation_failures,
                );
                eprintln!(
                    "Publishing: {} reviews opened, {} failed | authenticated: {}",
                    report.stats.reviews_opened,
                    report.stats.publish_failures,
                    report.stats.authenticated,
                );
                eprintln!("-----------------");
            }
        }
        Some(Command::Report { ref file }) => {
            let issues = mender_report::aggregate_file(file)?;
            print_issue_report(&issues, cli.format)?;
        }
        Some(Command::Init) => {
            let path = std::path::Path::new(".mender.toml");
            if path.exists() {
                miette::bail!(".mender.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .mender.toml with default configuration");
        }
        Some(Command::Doctor) => {
            run_doctor(&config, cli.format, use_color)?;
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "mender", &mut std::io::stdout());
        }
    }

    Ok(())
}
