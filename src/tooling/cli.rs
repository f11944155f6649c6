//! CLI Tooling
//!
//! Command-line interface for mirror operations: catalog listing, per-node
//! sync/offload, bulk eviction and the live status view.

use crate::config::MirrorConfig;
use crate::course::catalog::{CatalogClient, CourseCatalog};
use crate::course::Course;
use crate::error::SyncError;
use crate::logging::init_logging;
use crate::mirror::fetch::HttpResourceFetcher;
use crate::mirror::{MirrorContext, MirrorEngine};
use crate::status::{
    HttpSnapshotFetcher, OrchestratorState, SnapshotFetcher, StatusSnapshot, StatusStreamClient,
    TaskState, WebSocketConnector,
};
use crate::sync_state::SyncStateTracker;
use crate::tree::{NodeIdx, ResourceTree};
use anyhow::{anyhow, Context as _, Result};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use owo_colors::{AnsiColors, OwoColorize};
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Coursemirror CLI - selective local mirroring of remote course resources
#[derive(Parser)]
#[command(name = "coursemirror")]
#[command(about = "Mirror remote course resources to a local sync root")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and list the course catalog
    Courses,
    /// List a course's resources with their sync state
    Resources {
        /// Course code
        course: String,
    },
    /// Download a resource into the sync root
    Sync {
        /// Course code
        course: String,
        /// Resource path, display names joined with '/'
        path: String,
    },
    /// Delete the local copy of a resource
    Offload {
        /// Course code
        course: String,
        /// Resource path, display names joined with '/'
        path: String,
    },
    /// Best-effort eviction of every mirrored resource
    OffloadAll,
    /// Ask the server to reindex a course's resources
    Update {
        /// Course code
        course: String,
    },
    /// Show orchestrator status
    Status {
        /// Keep listening for live updates
        #[arg(long)]
        watch: bool,
    },
}

pub struct CliContext {
    config: MirrorConfig,
}

impl CliContext {
    pub fn new(config_path: Option<PathBuf>, log_level: Option<String>) -> Result<Self> {
        let mut config =
            MirrorConfig::load(config_path.as_deref()).context("loading configuration")?;
        if let Some(level) = log_level {
            config.logging.level = level;
        }
        init_logging(Some(&config.logging))?;
        Ok(Self { config })
    }

    pub async fn execute(&self, command: &Commands) -> Result<()> {
        match command {
            Commands::Courses => self.cmd_courses().await,
            Commands::Resources { course } => self.cmd_resources(course).await,
            Commands::Sync { course, path } => self.cmd_sync(course, path).await,
            Commands::Offload { course, path } => self.cmd_offload(course, path).await,
            Commands::OffloadAll => self.cmd_offload_all().await,
            Commands::Update { course } => self.cmd_update(course).await,
            Commands::Status { watch } => self.cmd_status(*watch).await,
        }
    }

    fn token(&self) -> Result<SecretString> {
        self.config
            .token
            .clone()
            .ok_or_else(|| anyhow!("no bearer token configured (set MIRROR_TOKEN or the config file)"))
    }

    /// Destructive operations require a configured sync root.
    fn mirror_context(&self) -> Result<MirrorContext> {
        let sync_root = self
            .config
            .sync_root
            .clone()
            .ok_or_else(|| anyhow!("no sync root configured; refusing to touch the filesystem"))?;
        Ok(MirrorContext {
            sync_root,
            token: self.token()?,
        })
    }

    fn engine(&self) -> MirrorEngine {
        MirrorEngine::new(Arc::new(HttpResourceFetcher::new(self.config.base_url())))
    }

    async fn fetch_catalog(&self) -> Result<CourseCatalog> {
        let client = CatalogClient::new(self.config.base_url());
        let courses = client.fetch_courses(&self.token()?).await?;
        let mut catalog = CourseCatalog::new();
        catalog.replace_all(courses);
        Ok(catalog)
    }

    async fn course_tree(&self, code: &str) -> Result<(Course, ResourceTree)> {
        let catalog = self.fetch_catalog().await?;
        let course = catalog
            .get(code)
            .ok_or_else(|| anyhow!("unknown course: {code}"))?
            .clone();
        let tree = ResourceTree::build(course.filemap.clone().unwrap_or_default(), &course.code);
        Ok((course, tree))
    }

    fn find_node(tree: &ResourceTree, path: &str) -> Result<NodeIdx> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        tree.find_by_path(&segments)
            .ok_or_else(|| anyhow!("no resource at path: {path}"))
    }

    async fn cmd_courses(&self) -> Result<()> {
        let catalog = self.fetch_catalog().await?;
        let mut table = Table::new();
        table.set_header(vec!["Code", "Name", "Points", "Resources"]);
        for course in catalog.courses() {
            let tree =
                ResourceTree::build(course.filemap.clone().unwrap_or_default(), &course.code);
            table.add_row(vec![
                course.code.clone(),
                course.name.clone(),
                course.points.to_string(),
                tree.resource_count().to_string(),
            ]);
        }
        println!("{table}");
        Ok(())
    }

    async fn cmd_resources(&self, code: &str) -> Result<()> {
        let (course, tree) = self.course_tree(code).await?;
        println!("{} ({})", course.name, course.code);
        if let Some(summary) = &course.summary {
            println!("{summary}");
        }
        let sync_root = self.config.sync_root.as_deref();
        for idx in tree.flatten_all() {
            let node = tree.node(idx);
            let marker = match SyncStateTracker::is_synced(&tree, idx, sync_root) {
                Some(true) => format!("{}", "synced".color(AnsiColors::Green)),
                Some(false) => "-".to_string(),
                None => "?".to_string(),
            };
            let mut details = Vec::new();
            if let Some(subtype) = node.subtype {
                details.push(subtype.label().to_string());
            }
            if let Some(size) = node.size {
                details.push(format!("{size} B"));
            }
            println!(
                "{}{}  {} {}",
                "  ".repeat(node.depth),
                node.name,
                details.join(", "),
                marker
            );
        }
        Ok(())
    }

    async fn cmd_sync(&self, code: &str, path: &str) -> Result<()> {
        let (_, tree) = self.course_tree(code).await?;
        let idx = Self::find_node(&tree, path)?;
        let engine = self.engine();
        let ctx = self.mirror_context()?;
        match engine.sync(&tree, idx, &ctx).await {
            Ok(()) => {
                println!("Synced {path}");
                Ok(())
            }
            // Recoverable: let the user pick a new sync root, then retry
            // the same operation once.
            Err(SyncError::Permission(denied)) => {
                eprintln!("Permission denied at {}", denied.display());
                let new_root: String = dialoguer::Input::new()
                    .with_prompt("Choose a new sync location")
                    .interact_text()?;
                let retry_ctx = MirrorContext {
                    sync_root: PathBuf::from(new_root),
                    token: ctx.token,
                };
                engine.sync(&tree, idx, &retry_ctx).await?;
                println!("Synced {path}");
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn cmd_offload(&self, code: &str, path: &str) -> Result<()> {
        let (_, tree) = self.course_tree(code).await?;
        let idx = Self::find_node(&tree, path)?;
        self.engine().offload(&tree, idx, &self.mirror_context()?).await?;
        println!("Offloaded {path}");
        Ok(())
    }

    async fn cmd_offload_all(&self) -> Result<()> {
        let catalog = self.fetch_catalog().await?;
        let engine = self.engine();
        let ctx = self.mirror_context()?;
        for course in catalog.courses() {
            let tree =
                ResourceTree::build(course.filemap.clone().unwrap_or_default(), &course.code);
            let nodes = tree.flatten_all();
            engine.offload_all(&tree, &nodes, &ctx).await;
            info!(course = %course.code, nodes = nodes.len(), "Course offloaded");
        }
        println!("Offload attempted for all mirrored resources");
        Ok(())
    }

    async fn cmd_update(&self, code: &str) -> Result<()> {
        let catalog = self.fetch_catalog().await?;
        let course = catalog
            .get(code)
            .ok_or_else(|| anyhow!("unknown course: {code}"))?;
        if !course.can_update {
            return Err(anyhow!("course {code} does not offer server-side reindexing"));
        }
        let client = CatalogClient::new(self.config.base_url());
        client.request_reindex(code, &self.token()?).await?;
        println!("Reindex requested for {code}");
        Ok(())
    }

    async fn cmd_status(&self, watch: bool) -> Result<()> {
        let fetcher = Arc::new(HttpSnapshotFetcher::new(self.config.base_url()));
        if !watch {
            let snapshot = fetcher.fetch_full().await?;
            print_status(&snapshot);
            return Ok(());
        }

        let client =
            StatusStreamClient::new(fetcher, Arc::new(WebSocketConnector), self.config.ws_url());
        let listener = client.spawn();
        let mut updates = listener.subscribe();
        loop {
            if let Some(snapshot) = updates.borrow_and_update().clone() {
                print_status(&snapshot);
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
        listener.stop().await;
        Ok(())
    }
}

fn orchestrator_color(state: OrchestratorState) -> AnsiColors {
    match state {
        OrchestratorState::Idle => AnsiColors::Green,
        OrchestratorState::CleaningUp => AnsiColors::Cyan,
        OrchestratorState::Busy => AnsiColors::Yellow,
        OrchestratorState::Unknown => AnsiColors::Default,
    }
}

fn task_color(state: TaskState) -> AnsiColors {
    match state {
        TaskState::Created | TaskState::Pending => AnsiColors::Cyan,
        TaskState::Running => AnsiColors::Yellow,
        TaskState::Finished => AnsiColors::Green,
        TaskState::Error => AnsiColors::Red,
        TaskState::Unknown => AnsiColors::Default,
    }
}

fn orchestrator_label(state: OrchestratorState) -> &'static str {
    match state {
        OrchestratorState::Idle => "idle",
        OrchestratorState::CleaningUp => "cleaning up",
        OrchestratorState::Busy => "busy",
        OrchestratorState::Unknown => "unknown",
    }
}

fn task_label(state: TaskState) -> &'static str {
    match state {
        TaskState::Created => "created",
        TaskState::Pending => "pending",
        TaskState::Running => "running",
        TaskState::Finished => "finished",
        TaskState::Error => "error",
        TaskState::Unknown => "unknown",
    }
}

fn print_status(snapshot: &StatusSnapshot) {
    println!("{}", snapshot.message);
    println!("Version: {}", snapshot.version);

    let orchestrator = &snapshot.orchestrator;
    println!();
    println!(
        "Orchestrator: {} [{}]",
        orchestrator.message.as_deref().unwrap_or(""),
        orchestrator_label(orchestrator.state).color(orchestrator_color(orchestrator.state))
    );

    if orchestrator.tasks.is_empty() {
        println!("  no tasks running");
    } else {
        let mut tasks = orchestrator.tasks.clone();
        tasks.sort_by(|a, b| task_label(b.state).cmp(task_label(a.state)));
        for task in &tasks {
            let progress = task
                .progress
                .map(|p| format!(" ({:.2}%)", p * 100.0))
                .unwrap_or_default();
            println!(
                "  {}  {}{}",
                task.id,
                task_label(task.state).color(task_color(task.state)),
                progress
            );
        }
    }

    if orchestrator.jobs.is_empty() {
        println!("  job history unavailable");
    } else {
        let mut jobs = orchestrator.jobs.clone();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        for job in &jobs {
            println!("  {}  {}", job.id, job.message.as_deref().unwrap_or(""));
        }
    }
}
