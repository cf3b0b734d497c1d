// ABOUTME: CLI binary for the cfread problem and editorial extractor.
// ABOUTME: Extracts problems by reference and prints bundles as HTML, markdown, text or JSON.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use cfread::options::DEFAULT_ORIGIN;
use cfread::{
    load_rules_from_path, Client, ContentBundle, ContentType, ExtractError, ProblemRef,
    StatementPayload,
};
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cfread", version)]
#[command(about = "Fetch competitive-programming problems and their editorials")]
struct Args {
    /// Problems to extract, e.g. 1234C or 1234/C
    #[arg()]
    problems: Vec<ProblemRef>,

    /// Output format: html (default), markdown/md, text/txt
    #[arg(short = 'f', long = "format", default_value = "html")]
    format: String,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Output JSON bundles instead of rendered content
    #[arg(long = "json")]
    json_output: bool,

    /// Skip the editorial stage
    #[arg(long = "statement-only")]
    statement_only: bool,

    /// Print the rated problem list as JSON and exit
    #[arg(long = "problems")]
    list_problems: bool,

    /// Forwarding proxy; the encoded page URL replaces {url} or is appended
    #[arg(long = "proxy", env = "CFREAD_PROXY")]
    proxy: Option<String>,

    /// Site origin
    #[arg(long = "origin", env = "CFREAD_ORIGIN", default_value = DEFAULT_ORIGIN)]
    origin: String,

    /// Per-fetch timeout in milliseconds
    #[arg(long = "timeout-ms", default_value_t = 15_000)]
    timeout_ms: u64,

    /// JSON file replacing the built-in site rules
    #[arg(long = "rules")]
    rules: Option<PathBuf>,

    /// Problems extracted in parallel
    #[arg(long = "concurrency", default_value_t = 4)]
    concurrency: usize,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,
}

fn render_bundle(bundle: &ContentBundle, problem: &ProblemRef, content_type: ContentType) -> String {
    match content_type {
        ContentType::Html => bundle.format_html(problem),
        ContentType::Markdown => bundle.format_markdown(problem),
        ContentType::Text => bundle.format_text(problem),
    }
}

fn render_statement(payload: &StatementPayload, content_type: ContentType) -> String {
    match content_type {
        ContentType::Html => payload.statement_html.clone(),
        ContentType::Markdown => cfread::formats::html_to_markdown(&payload.statement_html),
        ContentType::Text => cfread::formats::html_to_text(&payload.statement_html),
    }
}

/// One JSON value per result, or the single value when there is one.
fn join_json(values: Vec<serde_json::Value>) -> String {
    let value = if values.len() == 1 {
        values.into_iter().next().unwrap_or_default()
    } else {
        serde_json::Value::Array(values)
    };
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

fn report(problem: &ProblemRef, client: &Client, err: &ExtractError) {
    eprintln!("error extracting {}: {}", problem, err);
    if let Ok(url) = client.problem_url(problem) {
        eprintln!("{}", err.user_message(&url, client.options().timeout));
    }
}

async fn run(args: &Args, client: &Client) -> (Option<String>, bool) {
    let content_type = ContentType::from(args.format.as_str());

    if args.list_problems {
        return match client.fetch_problems().await {
            Ok(problems) => (serde_json::to_string_pretty(&problems).ok(), false),
            Err(e) => {
                eprintln!("error fetching problem list: {}", e);
                (None, true)
            }
        };
    }

    let mut had_error = false;
    let mut rendered = Vec::new();
    let mut values = Vec::new();

    if args.statement_only {
        for problem in &args.problems {
            match client.extract_statement(problem.contest_id, &problem.index).await {
                Ok(payload) => {
                    values.push(json!({
                        "problem": problem,
                        "statementHtml": payload.statement_html,
                        "tutorialUrl": payload.tutorial_url,
                    }));
                    rendered.push(render_statement(&payload, content_type));
                }
                Err(e) => {
                    report(problem, client, &e);
                    had_error = true;
                }
            }
        }
    } else {
        let results = client.extract_many(&args.problems, args.concurrency).await;
        for (problem, result) in args.problems.iter().zip(results) {
            match result {
                Ok(bundle) => {
                    rendered.push(render_bundle(&bundle, problem, content_type));
                    values.push(serde_json::to_value(&bundle).unwrap_or_default());
                }
                Err(e) => {
                    report(problem, client, &e);
                    had_error = true;
                }
            }
        }
    }

    if rendered.is_empty() {
        return (None, had_error);
    }
    let output = if args.json_output {
        join_json(values)
    } else {
        rendered.join("\n\n")
    };
    (Some(output), had_error)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if !args.list_problems && args.problems.is_empty() {
        eprintln!("error: at least one problem is required, e.g. 1234C, or use --problems");
        return ExitCode::from(1);
    }

    let mut builder = Client::builder()
        .origin(args.origin.clone())
        .timeout(Duration::from_millis(args.timeout_ms));
    if let Some(proxy) = &args.proxy {
        builder = builder.proxy(proxy.clone());
    }
    if let Some(path) = &args.rules {
        match load_rules_from_path(path) {
            Ok(rules) => builder = builder.rules(rules),
            Err(e) => {
                eprintln!("error: {:#}", e);
                return ExitCode::from(1);
            }
        }
    }
    let client = builder.build();

    let start = Instant::now();
    let (output, mut had_error) = run(&args, &client).await;
    let elapsed = start.elapsed();

    if let Some(output_str) = output {
        if let Some(output_path) = &args.output {
            if let Err(e) = fs::write(output_path, &output_str) {
                eprintln!("error writing to {:?}: {}", output_path, e);
                had_error = true;
            }
        } else {
            println!("{}", output_str);
        }
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
