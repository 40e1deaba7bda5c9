use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use job_tracker::api::job::export::default_file_name;
use job_tracker::api::job::stats::SUMMARY_TOP_COMPANIES;
use job_tracker::api::job::{
    ApplicationStatus, JobApplication, JobService, JobUpdate, NewJob, QueryOutcome, SalaryInput,
};

/// Track job applications in a local SQLite database
#[derive(Parser, Debug)]
#[command(name = "job-tracker", version)]
pub struct Cli {
    /// SQLite connection string, overrides DATABASE_URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Log directory, overrides LOG_DIR
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API (default)
    Serve,
    /// Add a new job application
    Add {
        company: String,
        role: String,
        #[arg(long)]
        location: Option<String>,
        /// Free text, e.g. 2025-11-30
        #[arg(long)]
        applied_date: Option<String>,
        /// Applied / Online Test / Interview / Rejected / Offer / Other
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        salary: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List all applications, most recent first
    List,
    /// Show every field of one application
    Show { id: i64 },
    /// Change status, date, salary or notes; omitted values are kept
    Update {
        id: i64,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        applied_date: Option<String>,
        #[arg(long)]
        salary: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete one application
    Delete {
        id: i64,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// List applications with a status (case-insensitive, exact)
    Status {
        #[arg(default_value = "")]
        status: String,
    },
    /// Search company, role and location for a keyword
    Search {
        #[arg(default_value = "")]
        keyword: String,
    },
    /// Show totals, counts by status and top companies
    Stats {
        #[arg(long, default_value_t = SUMMARY_TOP_COMPANIES)]
        top: u32,
    },
    /// Export all applications to CSV
    Export {
        /// Output path; defaults to job_applications_<timestamp>.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run a one-shot command against the store
pub async fn run(command: Command, service: &JobService) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Serve => {
            return Err("serve starts the HTTP server and is not a one-shot command".into());
        }
        Command::Add {
            company,
            role,
            location,
            applied_date,
            status,
            salary,
            notes,
        } => {
            let job = NewJob {
                company,
                role,
                location,
                applied_date,
                status,
                salary: salary.as_deref().map(SalaryInput::from),
                notes,
            };
            let outcome = service.create(&job).await?;
            for warning in &outcome.warnings {
                println!("{}", warning);
            }
            println!("Job application saved with ID {}.", outcome.id);
        }
        Command::List => {
            let jobs = service.list().await?;
            if jobs.is_empty() {
                println!("No job applications found yet.");
            } else {
                println!("=== All Job Applications ===");
                print_table(&jobs);
            }
        }
        Command::Show { id } => match service.read(id).await? {
            Some(job) => print_details(&job),
            None => println!("No job found with ID {}", id),
        },
        Command::Update {
            id,
            status,
            applied_date,
            salary,
            notes,
        } => {
            let changes = JobUpdate {
                status,
                applied_date,
                salary: salary.as_deref().map(SalaryInput::from),
                notes,
            };
            let outcome = service.update(id, &changes).await?;
            for warning in &outcome.warnings {
                println!("{}", warning);
            }
            if outcome.found {
                println!("Job {} updated.", id);
            } else {
                println!("No job found with ID {}", id);
            }
        }
        Command::Delete { id, yes } => {
            let Some(job) = service.read(id).await? else {
                println!("No job found with ID {}", id);
                return Ok(());
            };
            if !yes {
                println!(
                    "Not deleting {} - {}. Re-run with --yes to confirm.",
                    job.company, job.role
                );
                return Ok(());
            }
            let deleted = service.delete(id).await?;
            println!("{}", delete_message(&job, deleted));
        }
        Command::Status { status } => match service.filter_by_status(&status).await? {
            QueryOutcome::Skipped => {
                let suggested: Vec<String> = ApplicationStatus::suggested()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                println!("No status entered. Try one of: {}", suggested.join(" / "));
            }
            QueryOutcome::Matched(jobs) if jobs.is_empty() => {
                println!("No applications found with status: {}", status.trim());
            }
            QueryOutcome::Matched(jobs) => {
                println!("=== Applications with status: {} ===", status.trim());
                print_table(&jobs);
            }
        },
        Command::Search { keyword } => match service.search(&keyword).await? {
            QueryOutcome::Skipped => println!("No keyword entered."),
            QueryOutcome::Matched(jobs) if jobs.is_empty() => {
                println!("No jobs found matching: {}", keyword.trim());
            }
            QueryOutcome::Matched(jobs) => {
                println!("=== Search results for '{}' ===", keyword.trim());
                print_table(&jobs);
            }
        },
        Command::Stats { top } => {
            let summary = service.summary(top).await?;
            println!("=== Application Summary ===");
            println!("Total applications: {}", summary.total);
            if summary.total > 0 {
                println!("\nBy status:");
                for (status, count) in &summary.by_status {
                    println!("  {}: {}", status, count);
                }
                println!("\nTop companies you applied to:");
                for entry in &summary.top_companies {
                    println!("  {}: {}", entry.company, entry.count);
                }
            }
        }
        Command::Export { output } => {
            let rows = service.export_all().await?;
            if rows.record_count() == 0 {
                println!("No jobs to export.");
                return Ok(());
            }
            let path = output
                .unwrap_or_else(|| PathBuf::from(default_file_name(&chrono::Local::now())));
            let written = rows.write_csv(File::create(&path)?)?;
            println!("Exported {} jobs to {}", written, path.display());
        }
    }
    Ok(())
}

fn print_table(jobs: &[JobApplication]) {
    println!(
        "{:<4} {:<20} {:<20} {:<12} {:<12} {:<12} {:<10}",
        "ID", "Company", "Role", "Location", "Date", "Status", "Salary"
    );
    println!("{}", "-".repeat(95));
    for job in jobs {
        println!(
            "{:<4} {:<20} {:<20} {:<12} {:<12} {:<12} {:<10}",
            job.id,
            truncate(&job.company, 18),
            truncate(&job.role, 18),
            truncate(or_dash(&job.location), 10),
            or_dash(&job.applied_date),
            truncate(or_dash(&job.status), 10),
            salary_cell(job.salary),
        );
    }
}

fn print_details(job: &JobApplication) {
    println!("Job {}:", job.id);
    println!("  Company : {}", job.company);
    println!("  Role    : {}", job.role);
    println!("  Location: {}", or_dash(&job.location));
    println!("  Date    : {}", or_dash(&job.applied_date));
    println!("  Status  : {}", or_dash(&job.status));
    println!("  Salary  : {}", salary_cell(job.salary));
    println!("  Notes   : {}", or_dash(&job.notes));
}

/// Outcome line for a delete; the row may vanish between lookup and delete
fn delete_message(job: &JobApplication, deleted: bool) -> String {
    if deleted {
        format!("Deleted {} - {}.", job.company, job.role)
    } else {
        format!("No job found with ID {}", job.id)
    }
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn salary_cell(salary: Option<f64>) -> String {
    salary.map_or_else(|| "-".to_string(), |s| format!("{:.0}", s))
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
