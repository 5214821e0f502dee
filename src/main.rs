use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use gpa_forecast::{analyze, AnalyticsConfig, AnalyticsReport, Course, GradeScale, Projection};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod db;
mod records;

#[derive(Parser)]
#[command(name = "gpa-forecast")]
#[command(about = "GPA trend forecasting and course strength analysis", long_about = None)]
struct Cli {
    /// Only log errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Log pipeline internals
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Replace stored courses with the sample record
    Seed,
    /// Add a course; the letter grade is derived from marks when omitted
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 3)]
        credits: u32,
        #[arg(long)]
        term: u32,
        #[arg(long)]
        grade: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        marks: Option<u8>,
        /// JSON object mapping letter grades to points
        #[arg(long)]
        scale: Option<PathBuf>,
    },
    /// Delete a stored course
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// List stored courses
    List,
    /// Import courses from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
        /// JSON object mapping letter grades to points
        #[arg(long)]
        scale: Option<PathBuf>,
    },
    /// Print GPA, forecast, and course strengths
    Analyze {
        #[command(flatten)]
        analysis: AnalysisArgs,
        /// Emit the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        analysis: AnalysisArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct AnalysisArgs {
    /// Read courses from a CSV file instead of the database
    #[arg(long)]
    csv: Option<PathBuf>,
    /// JSON object mapping letter grades to points
    #[arg(long)]
    scale: Option<PathBuf>,
    /// Number of strength clusters
    #[arg(long, default_value = "3")]
    clusters: NonZeroUsize,
    /// Slope beyond which the trend counts as rising or falling
    #[arg(long, default_value_t = 0.05)]
    trend_threshold: f64,
}

impl AnalysisArgs {
    fn config(&self) -> anyhow::Result<AnalyticsConfig> {
        Ok(AnalyticsConfig {
            scale: load_scale(self.scale.as_deref())?,
            clusters: self.clusters,
            trend_threshold: self.trend_threshold,
            ..AnalyticsConfig::default()
        })
    }

    async fn load_courses(&self, scale: &GradeScale) -> anyhow::Result<Vec<Course>> {
        match &self.csv {
            Some(path) => records::read_courses(path, scale),
            None => db::fetch_courses(&connect().await?).await,
        }
    }

    fn source_label(&self) -> Option<String> {
        self.csv.as_ref().map(|path| path.display().to_string())
    }

    async fn run(&self) -> anyhow::Result<AnalyticsReport> {
        let config = self.config()?;
        let courses = self.load_courses(&config.scale).await?;
        tracing::info!(courses = courses.len(), "running analytics");
        analyze(&courses, &config).context("analytics failed")
    }
}

/// Reads a JSON object such as `{"A": 4.0, "B": 3.0}`, or the standard scale.
fn load_scale(path: Option<&Path>) -> anyhow::Result<GradeScale> {
    let Some(path) = path else {
        return Ok(GradeScale::default());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read grade scale {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid grade scale in {}", path.display()))
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("GPA_FORECAST_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn print_summary(report: &AnalyticsReport) {
    println!(
        "GPA {:.2} across {} credits (term std dev {:.3})",
        report.overall_gpa, report.total_credits, report.term_gpa_std_dev
    );
    for term in report.terms.iter() {
        println!("- term {}: GPA {:.2} over {} credits", term.term, term.gpa, term.credits);
    }

    match &report.projection {
        Projection::Forecast(forecast) => println!(
            "Forecast for term {}: {:.2} ({}, r² {:.2})",
            forecast.next_term, forecast.gpa, forecast.trend, forecast.fit.r_squared
        ),
        Projection::InsufficientData { terms } => {
            println!("Forecast unavailable: {terms} term(s) recorded, at least 2 needed.")
        }
    }

    for (label, courses) in [
        ("Strong", &report.strengths.strong),
        ("Average", &report.strengths.average),
        ("Weak", &report.strengths.weak),
    ] {
        let names: Vec<&str> = courses.iter().map(|course| course.name.as_str()).collect();
        println!("{label}: {}", if names.is_empty() { "-".to_string() } else { names.join(", ") });
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&connect().await?).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let count = db::seed(&connect().await?).await?;
            println!("Loaded {count} sample courses.");
        }
        Commands::Add {
            name,
            credits,
            term,
            grade,
            marks,
            scale,
        } => {
            let scale = load_scale(scale.as_deref())?;
            let course = db::add_course(
                &connect().await?,
                db::NewCourse {
                    name,
                    credits,
                    grade,
                    term,
                    marks,
                },
                &scale,
            )
            .await?;
            println!(
                "Added course {}: {} ({}, term {}).",
                course.id, course.name, course.grade, course.term
            );
        }
        Commands::Delete { id } => {
            if db::delete_course(&connect().await?, id).await? {
                println!("Deleted course {id}.");
            } else {
                println!("No course with id {id}.");
            }
        }
        Commands::List => {
            let courses = db::fetch_courses(&connect().await?).await?;
            if courses.is_empty() {
                println!("No courses stored.");
                return Ok(());
            }
            for course in courses.iter() {
                let marks = course
                    .marks
                    .map(|marks| format!(", marks {marks}"))
                    .unwrap_or_default();
                println!(
                    "- [{}] {} (term {}, {} credits, {}{})",
                    course.id, course.name, course.term, course.credits, course.grade, marks
                );
            }
        }
        Commands::Import { csv, scale } => {
            let scale = load_scale(scale.as_deref())?;
            let inserted = db::import_csv(&connect().await?, &csv, &scale).await?;
            println!("Inserted {inserted} courses from {}.", csv.display());
        }
        Commands::Analyze { analysis, json } => {
            let report = analysis.run().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_summary(&report);
            }
        }
        Commands::Report { analysis, out } => {
            let report = analysis.run().await?;
            let text = gpa_forecast::report::build_report(
                analysis.source_label().as_deref(),
                Utc::now().date_naive(),
                &report,
            );
            std::fs::write(&out, text)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
