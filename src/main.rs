// src/main.rs - pbxpatch command line
use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use pbxpatch::add::{self, BatchReport, BatchSpec, FileSpec};
use pbxpatch::fix;
use pbxpatch::report;
use pbxpatch::workflow::{self, CommitOptions, Confirm, Workspace};
use pbxpatch::{AutoApprove, BackupStyle, Config, Manifest, Ownership, PhaseKind, TerminalPrompt};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pbxpatch", version)]
#[command(about = "Edit Xcode project manifests", long_about = None)]
struct Cli {
    /// Project root (defaults to the config's root, then the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Manifest to edit; discovered under the root when omitted
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show the diff without writing anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Write without asking for confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    /// Backup naming: timestamp or random
    #[arg(long, global = true)]
    backup: Option<BackupStyle>,

    /// Group attribution for duplicate prefixes: tree or prefix
    #[arg(long, global = true)]
    ownership: Option<Ownership>,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register one file
    Add {
        /// Stored path, relative to the group
        path: String,
        /// Owning group (main group when omitted)
        #[arg(short, long)]
        group: Option<String>,
        /// sources, resources, frameworks or none
        #[arg(short, long, default_value = "sources")]
        phase: PhaseKind,
        /// Target whose phase lists the file
        #[arg(short, long)]
        target: Option<String>,
        /// Display name in annotations
        #[arg(long)]
        name: Option<String>,
        /// lastKnownFileType, inferred from the extension when omitted
        #[arg(long)]
        file_type: Option<String>,
    },
    /// Register every `files:` entry of the configuration
    AddPreset,
    /// Register new files found under directories
    AddBatch {
        /// Directories relative to the root; the configured batches when omitted
        dirs: Vec<String>,
        #[arg(short, long)]
        group: Option<String>,
        #[arg(short, long)]
        target: Option<String>,
        /// Extensions to pick up
        #[arg(long = "ext", default_value = "swift")]
        extensions: Vec<String>,
        /// Register at most this many files
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Strip path prefixes that repeat a parent group's path
    FixPaths,
    /// Remove references to files that no longer exist
    FixMissing,
    /// List source files the manifest never references
    Orphans,
    /// Remove missing references, fix paths and list orphans
    FixAll,
}

/// Everything a subcommand needs besides its own arguments
struct Session {
    config: Config,
    workspace: Workspace,
    original: String,
    manifest: Manifest,
    options: CommitOptions,
    json: bool,
    yes: bool,
}

impl Session {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(root) = &cli.root {
            config.root = root.clone();
        }
        if let Some(manifest) = &cli.manifest {
            config.manifest = Some(manifest.clone());
        }
        if let Some(backup) = cli.backup {
            config.backup = backup;
        }
        if let Some(ownership) = cli.ownership {
            config.ownership = ownership;
        }

        let workspace = Workspace::open(&config.root, config.manifest.as_deref())?;
        let original = workspace.read().with_context(|| {
            format!("failed to read {}", workspace.manifest.display())
        })?;
        let manifest = Manifest::parse(original.as_str()).with_context(|| {
            format!("failed to parse {}", workspace.manifest.display())
        })?;
        info!(manifest = %workspace.manifest.display(), records = manifest.records().len(), "loaded manifest");

        Ok(Self {
            options: CommitOptions {
                dry_run: cli.dry_run,
                backup: config.backup,
            },
            config,
            workspace,
            original,
            manifest,
            json: cli.json,
            yes: cli.yes,
        })
    }

    /// Print `report`, then write `updated` if it differs from what was read.
    fn finish<T, F>(&self, updated: &Manifest, report: &T, print: F) -> anyhow::Result<()>
    where
        T: Serialize,
        F: FnOnce(&mut Vec<u8>, &T) -> io::Result<()>,
    {
        let mut confirm: Box<dyn Confirm> = if self.yes {
            Box::new(AutoApprove)
        } else {
            Box::new(TerminalPrompt)
        };

        let mut stdout = io::stdout().lock();
        if !self.json {
            let mut buffer = Vec::new();
            print(&mut buffer, report)?;
            stdout.write_all(&buffer)?;
            stdout.flush()?;
        }

        let outcome = workflow::commit(
            &self.workspace.manifest,
            &self.original,
            updated.text(),
            self.options,
            confirm.as_mut(),
        )
        .with_context(|| format!("failed to write {}", self.workspace.manifest.display()))?;

        if self.json {
            report::write_json(&mut stdout, report, &outcome)?;
        } else {
            report::write_outcome(&mut stdout, &outcome)?;
        }
        Ok(())
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let session = Session::open(&cli)?;
    let manifest = session.manifest.clone();

    match cli.command {
        Commands::Add {
            path,
            group,
            phase,
            target,
            name,
            file_type,
        } => {
            let mut spec = FileSpec::new(path).with_phase(phase);
            spec.group = group;
            spec.target = target;
            spec.name = name;
            spec.file_type = file_type;
            let (updated, added) = add::add_files(manifest, &[spec])?;
            session.finish(&updated, &added, |out, r| report::write_add_report(out, r))
        }
        Commands::AddPreset => {
            if session.config.files.is_empty() {
                bail!("the configuration has no `files:` entries");
            }
            let (updated, added) = add::add_files(manifest, &session.config.files)?;
            session.finish(&updated, &added, |out, r| report::write_add_report(out, r))
        }
        Commands::AddBatch {
            dirs,
            group,
            target,
            extensions,
            limit,
        } => {
            let batches = if dirs.is_empty() {
                if session.config.batches.is_empty() {
                    bail!("no directories given and the configuration has no `batches:` entries");
                }
                session.config.batches.clone()
            } else {
                let mut spec = BatchSpec::new(dirs);
                spec.group = group;
                spec.target = target;
                spec.extensions = extensions;
                spec.limit = limit;
                vec![spec]
            };

            let mut updated = manifest;
            let mut reports: Vec<BatchReport> = Vec::with_capacity(batches.len());
            for spec in &batches {
                let (next, batch) = add::add_batch(updated, &session.config.root, spec)?;
                updated = next;
                reports.push(batch);
            }
            session.finish(&updated, &reports, |out, rs| {
                rs.iter().try_for_each(|r| report::write_batch_report(out, r))
            })
        }
        Commands::FixPaths => {
            let (updated, fixes) = fix::fix_duplicate_paths(&manifest, session.config.ownership)?;
            session.finish(&updated, &fixes, |out, r| report::write_path_fixes(out, r))
        }
        Commands::FixMissing => {
            let (updated, scan) = fix::remove_missing(&manifest, &session.config.fix_options())?;
            session.finish(&updated, &scan, |out, r| report::write_missing(out, r))
        }
        Commands::Orphans => {
            let orphans = fix::find_orphans(&manifest, &session.config.fix_options())?;
            session.finish(&manifest, &orphans, |out, r| report::write_orphans(out, r))
        }
        Commands::FixAll => {
            let (updated, summary) = fix::fix_all(&manifest, &session.config.fix_options())?;
            session.finish(&updated, &summary, |out, r| report::write_fix_all(out, r))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    pbxpatch::init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            for cause in e.chain().skip(1) {
                eprintln!("   caused by: {cause}");
            }
            ExitCode::FAILURE
        }
    }
}
