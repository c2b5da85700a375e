use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod config;
mod db;
mod error;
mod logging;
mod models;
mod query;
mod ranking;
mod rating;
mod report;
mod roster;
mod seed;
mod store;
mod tracker;
mod transfer;

use config::{Backend, Config};
use query::{LeaderboardFilter, SortKey};
use roster::{Adjustment, NewStudent, StudentPatch};
use store::{DatasetStore, FileStore};
use tracker::Tracker;

#[derive(Parser)]
#[command(name = "student-progress")]
#[command(about = "Track student scores, ranks and star ratings per field", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the Postgres schema
    InitDb,
    /// Replace the stored dataset with realistic sample data
    Seed,
    /// Show the ranked leaderboard
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        group: Option<String>,
        /// Only class representatives
        #[arg(long)]
        cr_only: bool,
        #[arg(long, value_enum, default_value_t = SortKey::Rank)]
        sort: SortKey,
        #[arg(long)]
        limit: Option<usize>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a student to a field
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        group: String,
        #[arg(long)]
        photo: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        percentage: Option<i64>,
    },
    /// Change a student's details
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        photo: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        percentage: Option<i64>,
    },
    /// Remove a student
    Delete { id: String },
    /// Make a student the representative of their field
    AssignCr {
        #[arg(long)]
        group: String,
        #[arg(long)]
        student: String,
    },
    /// Clear a field's representative
    RemoveCr {
        #[arg(long)]
        group: String,
    },
    /// Raise a student's percentage
    Bump {
        id: String,
        #[arg(long, default_value_t = 1)]
        by: i64,
    },
    /// Lower a student's percentage
    Drop {
        id: String,
        #[arg(long, default_value_t = 1)]
        by: i64,
    },
    /// Set a student's percentage
    Set {
        id: String,
        #[arg(allow_negative_numbers = true)]
        percentage: i64,
    },
    /// Write the dataset to a dated JSON file
    Export {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Replace the dataset with an exported JSON file
    Import { file: PathBuf },
    /// Add students from a CSV file (name,group_id,percentage,photo)
    ImportCsv { file: PathBuf },
    /// List integrity problems in the stored dataset
    Check,
    /// Generate a markdown report
    Report {
        #[arg(long)]
        group: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

async fn open_store(config: &Config) -> anyhow::Result<Box<dyn DatasetStore>> {
    match &config.backend {
        Backend::File => Ok(Box::new(FileStore::new(
            &config.data_dir,
            &config.bootstrap,
        ))),
        Backend::Postgres { database_url } => {
            let pool = connect(database_url).await?;
            Ok(Box::new(db::PgStore::new(pool, &config.bootstrap)))
        }
    }
}

async fn connect(database_url: &str) -> anyhow::Result<sqlx::PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = Config::from_env()?;

    match cli.command {
        Commands::InitDb => {
            let Backend::Postgres { database_url } = &config.backend else {
                bail!("init-db needs STUDENT_PROGRESS_STORE=postgres");
            };
            db::init_db(&connect(database_url).await?).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let store = open_store(&config).await?;
            store.save(&seed::sample_dataset()).await?;
            println!("Seed data saved.");
        }
        Commands::Check => {
            let store = open_store(&config).await?;
            let dataset = store.load().await.context("failed to load dataset")?;
            let problems = roster::violations(&dataset);
            if problems.is_empty() {
                println!(
                    "Dataset is consistent ({} fields, {} students).",
                    dataset.groups.len(),
                    dataset.students.len()
                );
            } else {
                for problem in &problems {
                    println!("- {problem}");
                }
                bail!("{} integrity problems found", problems.len());
            }
        }
        command => {
            let store = open_store(&config).await?;
            let mut tracker = Tracker::open(store)
                .await
                .context("failed to load dataset")?;
            if let Err(err) = run(&mut tracker, command).await {
                if tracker.is_dirty() {
                    return Err(err.context("change was applied but could not be saved"));
                }
                return Err(err);
            }
        }
    }

    Ok(())
}

async fn run<S: DatasetStore>(tracker: &mut Tracker<S>, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::List {
            search,
            group,
            cr_only,
            sort,
            limit,
            json,
        } => {
            let filter = LeaderboardFilter {
                search,
                group_id: group,
                representatives_only: cr_only,
                sort,
            };
            let mut rows = query::apply(tracker.ranked(), &filter);
            rows.truncate(limit.unwrap_or(rows.len()));

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            if rows.is_empty() {
                println!("No students match.");
                return Ok(());
            }

            let thresholds = &tracker.dataset().settings.star_thresholds;
            for student in &rows {
                let stars = rating::star_rating(student.percentage, thresholds).unwrap_or(0);
                println!(
                    "#{:<3} {:<24} {:<24} {:>3}% {}{}",
                    student.rank,
                    student.name,
                    student.group_name,
                    student.percentage,
                    rating::stars_label(stars, thresholds.len()),
                    if student.is_representative { "  CR" } else { "" }
                );
            }
        }
        Commands::Add {
            name,
            group,
            photo,
            percentage,
        } => {
            let id = tracker
                .add_student(NewStudent {
                    name,
                    group_id: group,
                    photo,
                    percentage,
                })
                .await?;
            println!("Added student {id}.");
        }
        Commands::Edit {
            id,
            name,
            group,
            photo,
            percentage,
        } => {
            tracker
                .edit_student(
                    &id,
                    StudentPatch {
                        name,
                        group_id: group,
                        photo,
                        percentage,
                    },
                )
                .await?;
            println!("Updated student {id}.");
        }
        Commands::Delete { id } => {
            tracker.delete_student(&id).await?;
            println!("Deleted student {id}.");
        }
        Commands::AssignCr { group, student } => {
            tracker.assign_representative(&group, &student).await?;
            println!("{student} is now the representative of {group}.");
        }
        Commands::RemoveCr { group } => {
            tracker.remove_representative(&group).await?;
            println!("{group} has no representative.");
        }
        Commands::Bump { id, by } => {
            let value = tracker.adjust_percentage(&id, Adjustment::Increase(by)).await?;
            println!("{id} is at {value}%.");
        }
        Commands::Drop { id, by } => {
            let value = tracker.adjust_percentage(&id, Adjustment::Decrease(by)).await?;
            println!("{id} is at {value}%.");
        }
        Commands::Set { id, percentage } => {
            let value = tracker
                .adjust_percentage(&id, Adjustment::Set(percentage))
                .await?;
            println!("{id} is at {value}%.");
        }
        Commands::Export { out_dir } => {
            let file = transfer::export_file(tracker.dataset(), Utc::now().date_naive())?;
            let path = out_dir.join(&file.file_name);
            std::fs::write(&path, &file.bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported to {}.", path.display());
        }
        Commands::Import { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let dataset = transfer::parse_dataset(&bytes)?;
            tracker.replace(dataset).await?;
            println!("Imported {}.", file.display());
        }
        Commands::ImportCsv { file } => {
            let reader = std::fs::File::open(&file)
                .with_context(|| format!("failed to open {}", file.display()))?;
            let (dataset, added) = transfer::import_students_csv(tracker.dataset(), reader)?;
            tracker.replace(dataset).await?;
            println!("Added {added} students from {}.", file.display());
        }
        Commands::Report { group, out } => {
            let report =
                report::build_report(tracker.dataset(), group.as_deref(), Utc::now().date_naive())?;
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::InitDb | Commands::Seed | Commands::Check => {
            unreachable!("handled before the dataset is opened")
        }
    }

    Ok(())
}
