//! CLI binary for edgequake-lessonplan.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PlannerConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_lessonplan::{
    check_api_key, extract_outline, generate_lesson_plan, generate_lesson_plan_to_file,
    render_markdown, resolve_api_key, AqfLevel, BloomsLevel, CompletionError, CompletionObserver,
    LessonDuration, LessonOptions, LessonPlanRequest, Observer, OutlineExtraction, PlannerConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// Shorten `s` to `max` characters, marking the cut with an ellipsis.
fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}\u{2026}")
    } else {
        s.to_string()
    }
}

// ── Spinner driven by completion events ──────────────────────────────────────

/// Terminal spinner that reports attempts and backoff waits of the
/// resilient caller.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    fn new(prefix: &str) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix(prefix.to_string());
        bar.set_message("Preparing…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl CompletionObserver for SpinnerObserver {
    fn on_attempt(&self, attempt: u32, max_attempts: u32) {
        self.bar
            .set_message(format!("waiting for model (attempt {attempt}/{max_attempts})"));
    }

    fn on_backoff(&self, attempt: u32, delay: Duration, reason: &str) {
        self.bar.println(format!(
            "  {} attempt {} failed: {}",
            cyan("⚠"),
            attempt,
            dim(&ellipsize(reason, 80)),
        ));
        self.bar.set_message(format!(
            "service busy, retrying in {:.1}s",
            delay.as_secs_f64()
        ));
    }

    fn on_success(&self, attempt: u32) {
        self.bar.finish_and_clear();
        if attempt > 1 {
            eprintln!("{} succeeded on attempt {}", green("✔"), attempt);
        }
    }

    fn on_failure(&self, error: &CompletionError) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), ellipsize(&error.to_string(), 120));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # List the Bloom's levels, AQF levels and durations
  lessonplan options

  # Extract subjects and lecture topics from an outline
  lessonplan outline BIO101_outline.pdf

  # Same, from a URL, as JSON
  lessonplan outline https://uni.example.edu/outlines/BIO101.pdf --json

  # Generate a lesson plan
  lessonplan generate --subject "Biology 101" --lecture "Cell Structure" \
      --focus "Membranes" --blooms apply --aqf 5 --duration 90 -o plan.md

  # Check that a Gemini key works
  lessonplan check-key

ENVIRONMENT VARIABLES:
  GOOGLE_API_KEY          Gemini API key (checked first)
  GEMINI_API_KEY          Gemini API key
  LESSONPLAN_API_KEY      Key to use instead of the two above
  LESSONPLAN_MODEL        Model ID (default: gemini-2.0-flash)
  LESSONPLAN_PROVIDER     Route through an edgequake-llm provider
                          (openai, anthropic, gemini, ollama, azure, …)
  PDFIUM_LIB_PATH         Directory containing the PDFium shared library
  RUST_LOG                Log filter, overrides -v / -q

  A .env file in the working directory is loaded before flags are parsed.
"#;

/// Extract course outlines and generate lesson plans with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "lessonplan",
    version,
    about = "Extract course outlines and generate lesson plans with an LLM",
    long_about = "Extract subjects, lecture topics and focus topics from a course outline PDF, \
and generate lesson plans aligned with Bloom's taxonomy and the Australian Qualifications \
Framework. Calls to the model are retried with exponential backoff when the service is \
overloaded or rate limited.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Gemini API key (falls back to GOOGLE_API_KEY / GEMINI_API_KEY).
    #[arg(long, global = true, env = "LESSONPLAN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID (e.g. gemini-2.0-flash, gemini-2.5-pro, gpt-4.1-nano).
    #[arg(long, global = true, env = "LESSONPLAN_MODEL")]
    model: Option<String>,

    /// edgequake-llm provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        global = true,
        env = "LESSONPLAN_PROVIDER",
        long_help = "Route calls through an edgequake-llm provider instead of the built-in \
          Gemini REST backend. The provider reads its own API key variable."
    )]
    provider: Option<String>,

    /// Attempts per model call before giving up on an overloaded service.
    #[arg(long, global = true, env = "LESSONPLAN_MAX_ATTEMPTS", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(1..=10))]
    max_attempts: u32,

    /// Delay before the first retry, in seconds; doubles on each retry.
    #[arg(long, global = true, env = "LESSONPLAN_BASE_DELAY", default_value_t = 2.0)]
    base_delay: f64,

    /// Per-attempt model call timeout in seconds.
    #[arg(long, global = true, env = "LESSONPLAN_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "LESSONPLAN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// PDF user password for encrypted outlines.
    #[arg(long, global = true, env = "LESSONPLAN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "LESSONPLAN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "LESSONPLAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "LESSONPLAN_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Bloom's taxonomy levels, AQF levels and lesson durations.
    Options {
        /// Output JSON instead of plain lists.
        #[arg(long)]
        json: bool,
    },

    /// Extract subjects, lecture topics and focus topics from an outline PDF.
    Outline {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Name to record for the outline (defaults to the file name).
        #[arg(long)]
        filename: Option<String>,

        /// Output the full extraction as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate a lesson plan.
    Generate {
        /// Subject name, e.g. "Biology 101".
        #[arg(long)]
        subject: String,

        /// Lecture topic from the outline's timetable.
        #[arg(long)]
        lecture: String,

        /// Focus topic within the lecture (omit for general coverage).
        #[arg(long)]
        focus: Option<String>,

        /// Bloom's taxonomy level: remember, understand, apply, analyze, evaluate, create.
        #[arg(long)]
        blooms: BloomsLevel,

        /// AQF level, 1-10.
        #[arg(long)]
        aqf: AqfLevel,

        /// Lesson duration: 30, 45, 60, 90, 120, 150 or 180 minutes, or e.g. "1.5h".
        #[arg(long)]
        duration: LessonDuration,

        /// Write the Markdown document to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output the lesson plan as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check that a Gemini API key is accepted.
    CheckKey {
        /// Key to check (defaults to --api-key, then the environment).
        key: Option<String>,
    },
}

impl Command {
    fn is_json(&self) -> bool {
        match self {
            Command::Options { json } => *json,
            Command::Outline { json, .. } | Command::Generate { json, .. } => *json,
            Command::CheckKey { .. } => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is not an error.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let global = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs are suppressed while the spinner is active.
    let show_progress = !global.quiet && !global.no_progress && !cli.command.is_json();
    let filter = if global.verbose {
        "debug"
    } else if global.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Options { json } => print_options(*json),

        Command::Outline {
            input,
            filename,
            json,
        } => {
            let observer = spinner(show_progress, "Outline");
            let config = build_config(global, observer)?;
            let outline = extract_outline(input, filename.as_deref(), &config, None)
                .await
                .context("Outline extraction failed")?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&outline).context("Failed to serialise outline")?
                );
            } else {
                print_outline(&outline);
            }
            Ok(())
        }

        Command::Generate {
            subject,
            lecture,
            focus,
            blooms,
            aqf,
            duration,
            output,
            json,
        } => {
            let request = LessonPlanRequest {
                subject_name: subject.clone(),
                lecture_topic: lecture.clone(),
                focus_topic: focus.clone(),
                blooms_taxonomy: *blooms,
                aqf_level: *aqf,
                lesson_duration: *duration,
            };
            let observer = spinner(show_progress, "Lesson plan");
            let config = build_config(global, observer)?;

            if let Some(path) = output {
                let plan = generate_lesson_plan_to_file(&request, path, &config, None)
                    .await
                    .context("Lesson plan generation failed")?;
                if !global.quiet {
                    eprintln!(
                        "{}  {} chars  →  {}",
                        green("✔"),
                        plan.content.chars().count(),
                        bold(&path.display().to_string()),
                    );
                }
            } else {
                let plan = generate_lesson_plan(&request, &config, None)
                    .await
                    .context("Lesson plan generation failed")?;
                if *json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&plan)
                            .context("Failed to serialise lesson plan")?
                    );
                } else {
                    io::stdout()
                        .lock()
                        .write_all(render_markdown(&plan).as_bytes())
                        .context("Failed to write to stdout")?;
                }
            }
            Ok(())
        }

        Command::CheckKey { key } => {
            let config = build_config(global, None)?;
            let key = match key.as_deref().or(global.api_key.as_deref()) {
                Some(k) => k.to_string(),
                None => resolve_api_key(None)
                    .context("No API key given")?
                    .expose()
                    .to_string(),
            };

            check_api_key(&key, &config)
                .await
                .context("API key check failed")?;
            if !global.quiet {
                eprintln!("{} API key is valid", green("✔"));
            }
            Ok(())
        }
    }
}

fn spinner(show_progress: bool, prefix: &str) -> Option<Observer> {
    show_progress.then(|| SpinnerObserver::new(prefix) as Observer)
}

/// Map global flags to `PlannerConfig`.
fn build_config(global: &GlobalArgs, observer: Option<Observer>) -> Result<PlannerConfig> {
    let base_delay = Duration::try_from_secs_f64(global.base_delay)
        .map_err(|e| anyhow::anyhow!("--base-delay {}: {e}", global.base_delay))?;

    let mut builder = PlannerConfig::builder()
        .max_attempts(global.max_attempts)
        .base_delay(base_delay)
        .api_timeout_secs(global.api_timeout)
        .download_timeout_secs(global.download_timeout);

    if let Some(ref model) = global.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = global.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref key) = global.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref password) = global.password {
        builder = builder.password(password);
    }
    if let Some(observer) = observer {
        builder = builder.observer(observer);
    }

    builder.build().context("Invalid configuration")
}

fn print_options(json: bool) -> Result<()> {
    let options = LessonOptions::standard();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&options).context("Failed to serialise options")?
        );
        return Ok(());
    }

    let sections = [
        ("Bloom's taxonomy", &options.blooms_taxonomy),
        ("AQF levels", &options.aqf_levels),
        ("Lesson durations", &options.lesson_durations),
    ];
    for (title, items) in sections {
        println!("{}", bold(title));
        for item in items {
            println!("  {item}");
        }
        println!();
    }
    Ok(())
}

fn print_outline(outline: &OutlineExtraction) {
    println!("{} {}", bold("Outline:"), outline.filename);

    println!("\n{}", bold("Subjects"));
    for subject in &outline.subject_names {
        println!("  {subject}");
    }

    println!("\n{}", bold("Lecture topics"));
    for (i, lecture) in outline.lecture_topics.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, lecture);
        for focus in outline.focus_topics(lecture) {
            println!("      {} {}", dim("-"), focus);
        }
    }

    // Mapped lectures the model did not list in the timetable.
    let extra: Vec<_> = outline
        .lecture_focus_mapping
        .keys()
        .filter(|k| !outline.lecture_topics.contains(*k))
        .collect();
    if !extra.is_empty() {
        println!("\n{}", bold("Other mapped topics"));
        for lecture in extra {
            println!("  {lecture}");
            for focus in outline.focus_topics(lecture) {
                println!("      {} {}", dim("-"), focus);
            }
        }
    }
}
