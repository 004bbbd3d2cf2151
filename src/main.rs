use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use librarian::cancel::CancelToken;
use librarian::cli::{run_bump, run_tag, BumpArgs, TagArgs};
use librarian::config::{self, Config};
use librarian::git::Git2Repository;
use librarian::policy::PolicyRegistry;
use librarian::{telemetry, ui, LibrarianError};

#[derive(Parser)]
#[command(
    name = "librarian",
    version,
    about = "Derive, record and tag releases of the libraries in a repository"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,

    #[arg(long, global = true, help = "Abort if the run takes longer than SECS seconds")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute next versions and record them in the manifest
    Bump {
        /// Library to release
        library: Option<String>,

        #[arg(long, help = "Release every library with changes since its last release")]
        all: bool,

        #[arg(long, value_name = "V", help = "Use this version instead of deriving one")]
        version: Option<String>,

        #[arg(long, help = "Preview what would happen without making changes")]
        dry_run: bool,
    },
    /// Tag the commit that performed the latest release
    Tag {
        #[arg(long, help = "Only tag this library's latest release")]
        library: Option<String>,

        #[arg(long, help = "Preview what would happen without making changes")]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose);

    let config = config::load_config(cli.config.as_deref()).context("loading configuration")?;

    if let Err(e) = run(cli, &config) {
        ui::display_error(&e.to_string());
        std::process::exit(e.exit_code());
    }
    Ok(())
}

fn run(cli: Cli, config: &Config) -> Result<(), LibrarianError> {
    let cancel = match cli.timeout {
        Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };

    match cli.command {
        Command::Bump {
            library,
            all,
            version,
            dry_run,
        } => {
            let args = BumpArgs {
                library,
                all,
                version,
                dry_run,
            };
            // Usage errors are reported before the repository is even opened
            args.validate()?;

            let repo = Git2Repository::open(".")?.with_cancel(cancel.clone());
            let workdir = repo
                .workdir()
                .map(PathBuf::from)
                .ok_or_else(|| LibrarianError::precondition("Repository has no working tree"))?;

            let report = run_bump(
                &args,
                config,
                &repo,
                &workdir,
                &PolicyRegistry::builtin(),
                &cancel,
            )?;
            ui::display_bump_plan(&report.plan, report.dry_run);
            if !report.plan.is_empty() && !report.dry_run {
                ui::display_success(&format!(
                    "Updated {}; commit it to complete the release",
                    config.manifest
                ));
            }
        }
        Command::Tag { library, dry_run } => {
            let repo = Git2Repository::open(".")?.with_cancel(cancel);
            let args = TagArgs { library, dry_run };

            let report = run_tag(&args, config, &repo, &PolicyRegistry::builtin())?;
            ui::display_status(&format!(
                "Release commit {} released: {}",
                report.release.commit,
                report.release.released.join(", ")
            ));
            ui::display_tags(&report.tags, report.dry_run);
        }
    }

    Ok(())
}
