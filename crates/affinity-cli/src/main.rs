//! Affinity CLI - reinforced weighted-edge graph store

use std::path::{Path, PathBuf};

use affinity_core::config::Config;
use affinity_core::domain::edge::{Direction, DistanceRange, Edge, EdgeKey};
use affinity_core::domain::graph::{AllAllRequest, ClosestQuery, CrossLinkRequest, LinkRequest, PairWeight};
use affinity_core::domain::ingest::FirehoseRecord;
use affinity_core::domain::traversal::{TraversalJob, TraversalResult};
use affinity_core::storage::GraphStore;
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "affinity")]
#[command(author, version, about = "Reinforced weighted-edge graph store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Namespace override for this invocation
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Database file override for this invocation
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Record or reinforce a relation between two nodes
    Link {
        entity: String,
        from: String,
        to: String,
        /// Direction (out, in or none)
        #[arg(short, long, value_parser = parse_direction, default_value = "none")]
        direction: Direction,
        /// Reinforcement weight
        #[arg(short, long, default_value_t = 1.0)]
        weight: f64,
        /// Set this distance instead of reinforcing
        #[arg(long, conflicts_with = "weight")]
        absolute: Option<f64>,
    },

    /// Nearest neighbors of a node
    Closest {
        entity: String,
        from: String,
        #[arg(short, long, value_parser = parse_direction, default_value = "none")]
        direction: Direction,
        /// Lower distance bound (inclusive)
        #[arg(long)]
        min: Option<f64>,
        /// Upper distance bound (inclusive)
        #[arg(long)]
        max: Option<f64>,
        #[arg(short, long)]
        limit: Option<usize>,
        /// Farthest first
        #[arg(long)]
        desc: bool,
    },

    /// Number of neighbors of a node
    Count {
        entity: String,
        from: String,
        #[arg(short, long, value_parser = parse_direction, default_value = "none")]
        direction: Direction,
    },

    /// List stored records
    Edges {
        #[arg(long)]
        from: Option<String>,
        #[arg(short, long)]
        entity: Option<String>,
        #[arg(short, long, value_parser = parse_direction)]
        direction: Option<Direction>,
        /// Follow each record with its inverse (requires --from)
        #[arg(long, requires = "from")]
        inverse: bool,
    },

    /// Remove a relation and its inverse
    Delete {
        entity: String,
        from: String,
        to: String,
        #[arg(short, long, value_parser = parse_direction, default_value = "none")]
        direction: Direction,
    },

    /// Remove every relation of a node
    DeleteNode {
        node: String,
        #[arg(short, long)]
        entity: Option<String>,
        #[arg(short, long, value_parser = parse_direction)]
        direction: Option<Direction>,
    },

    /// Link every pair of a collection
    AllAll {
        entity: String,
        #[arg(required = true, num_args = 1..)]
        nodes: Vec<String>,
        #[arg(short, long, value_parser = parse_direction, default_value = "none")]
        direction: Direction,
        /// Use one weight for every pair instead of positional weights
        #[arg(long)]
        constant: Option<f64>,
    },

    /// Link an origin to a collection and the collection among itself
    CrossLink {
        entity: String,
        #[arg(required = true, num_args = 1..)]
        nodes: Vec<String>,
        #[arg(short, long)]
        origin: Option<String>,
        /// Skip the pairwise links between elements
        #[arg(long)]
        no_cross: bool,
        /// Absolute distance for every link
        #[arg(long)]
        distance: Option<f64>,
        #[arg(short, long, value_parser = parse_direction, default_value = "none")]
        direction: Direction,
    },

    /// Multi-hop traversal, one job per hop
    Traverse {
        /// Start node
        from: String,
        /// Hops as `entity` or `entity:direction`
        #[arg(required = true, num_args = 1.., value_parser = parse_job)]
        jobs: Vec<TraversalJob>,
        #[arg(long)]
        min_path: Option<usize>,
        #[arg(long)]
        max_path: Option<usize>,
        /// Keep paths whose node count is a multiple of this
        #[arg(long)]
        mod_path: Option<usize>,
        #[arg(short, long)]
        concurrency: Option<usize>,
        /// Node field the last node of a path must carry
        #[arg(long, requires = "meta_min")]
        meta_field: Option<String>,
        /// Minimum value of --meta-field
        #[arg(long, requires = "meta_field")]
        meta_min: Option<f64>,
    },

    /// Ingest newline-delimited firehose records
    Ingest {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Node metadata documents
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum NodeAction {
    /// Show a node document
    Get { id: String },
    /// Replace a node document
    Set { id: String, data: String },
    /// Merge fields into a node document; null removes a field
    Patch { id: String, data: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

fn parse_direction(s: &str) -> Result<Direction, String> {
    Direction::parse(s).ok_or_else(|| format!("unknown direction '{}', expected out, in or none", s))
}

fn parse_job(s: &str) -> Result<TraversalJob, String> {
    let (entity, direction) = match s.rsplit_once(':') {
        Some((entity, direction)) => (entity, parse_direction(direction)?),
        None => (s, Direction::None),
    };
    if entity.trim().is_empty() {
        return Err(format!("hop '{}' has no entity", s));
    }
    Ok(TraversalJob::new(entity).direction(direction))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("affinity=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let out = Output {
        format: cli.format,
        quiet: cli.quiet,
    };

    if let Commands::Config { action } = cli.command {
        return cmd_config(action, out);
    }

    let mut config = Config::load()?;
    if let Some(namespace) = &cli.namespace {
        config.set("graph.namespace", namespace)?;
    }
    if let Some(db) = &cli.db {
        config.set("backend.path", &db.display().to_string())?;
    }

    if let Commands::Doctor = cli.command {
        return cmd_doctor(&config, out).await;
    }

    let store = GraphStore::open(&config).await?;
    let result = run(&store, &config, cli.command, out).await;
    store.close().await;
    result
}

async fn run(store: &GraphStore, config: &Config, command: Commands, out: Output) -> anyhow::Result<()> {
    let engine = &store.engine;
    match command {
        Commands::Link {
            entity,
            from,
            to,
            direction,
            weight,
            absolute,
        } => {
            let mut request = LinkRequest::new(entity, from, to).direction(direction).weight(weight);
            request.absolute_distance = absolute;
            let edges = engine.link(&request).await?;
            out.edges(&edges)
        }

        Commands::Closest {
            entity,
            from,
            direction,
            min,
            max,
            limit,
            desc,
        } => {
            let mut query = ClosestQuery::new(entity, from).direction(direction);
            if min.is_some() || max.is_some() {
                query = query.range(DistanceRange::new(
                    min.unwrap_or(DistanceRange::UNBOUNDED.min),
                    max.unwrap_or(DistanceRange::UNBOUNDED.max),
                ));
            }
            if let Some(limit) = limit {
                query = query.limit(limit);
            }
            if desc {
                query = query.descending();
            }
            let edges = engine.closest(&query).await?;
            out.edges(&edges)
        }

        Commands::Count {
            entity,
            from,
            direction,
        } => {
            let count = engine.count(&engine.scope(&from, &entity, direction)).await?;
            out.value(&count, || count.to_string())
        }

        Commands::Edges {
            from,
            entity,
            direction,
            inverse,
        } => {
            let mut filter = engine.filter();
            filter.from_node = from;
            filter.entity = entity;
            filter.direction = direction;
            let edges = engine.edges(&filter, inverse).await?;
            out.edges(&edges)
        }

        Commands::Delete {
            entity,
            from,
            to,
            direction,
        } => {
            let key = EdgeKey::new(engine.config().namespace.as_str(), from, entity, direction, to);
            let removed = engine.delete(&key).await?;
            out.removed(&removed)
        }

        Commands::DeleteNode {
            node,
            entity,
            direction,
        } => {
            let mut filter = engine.filter().from_node(node);
            filter.entity = entity;
            filter.direction = direction;
            let removed = engine.delete_by_node(&filter).await?;
            out.removed(&removed)
        }

        Commands::AllAll {
            entity,
            nodes,
            direction,
            constant,
        } => {
            let mut request = AllAllRequest::new(entity, nodes).direction(direction);
            if let Some(weight) = constant {
                request = request.weight(PairWeight::Constant(weight));
            }
            let edges = engine.all_all(&request).await?;
            out.edges(&edges)
        }

        Commands::CrossLink {
            entity,
            nodes,
            origin,
            no_cross,
            distance,
            direction,
        } => {
            let mut request = CrossLinkRequest::new(entity, nodes).direction(direction).cross(!no_cross);
            request.origin = origin;
            request.distance = distance;
            let edges = engine.cross_link(&request).await?;
            out.edges(&edges)
        }

        Commands::Traverse {
            from,
            mut jobs,
            min_path,
            max_path,
            mod_path,
            concurrency,
            meta_field,
            meta_min,
        } => {
            if let Some(first) = jobs.first_mut() {
                first.from_node = Some(from);
            }
            let mut options = config.traversal_options();
            options.min_path = min_path.unwrap_or(options.min_path);
            options.max_path = max_path.unwrap_or(options.max_path);
            options.mod_path = mod_path;
            options.concurrency = concurrency.or(options.concurrency);
            if let (Some(field), Some(min)) = (meta_field, meta_min) {
                options = options.metadata_filter(store.nodes.clone(), field, min);
            }
            let result = engine.traverse(&jobs, &options).await?;
            out.traversal(&result)
        }

        Commands::Ingest { file } => cmd_ingest(store, file.as_deref(), out).await,

        Commands::Node { action } => cmd_node(store, action, out).await,

        Commands::Config { .. } | Commands::Doctor => Ok(()),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn read_records(file: Option<&Path>) -> anyhow::Result<Vec<FirehoseRecord>> {
    let mut lines = match file {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            BufReader::new(Box::new(file) as Box<dyn tokio::io::AsyncRead + Unpin + Send>).lines()
        }
        None => BufReader::new(Box::new(tokio::io::stdin()) as Box<dyn tokio::io::AsyncRead + Unpin + Send>).lines(),
    };

    let mut records = Vec::new();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: FirehoseRecord =
            serde_json::from_str(&line).with_context(|| format!("Invalid firehose record on line {}", line_no))?;
        records.push(record);
    }
    debug!(records = records.len(), "Read ingestion input");
    Ok(records)
}

async fn cmd_ingest(store: &GraphStore, file: Option<&Path>, out: Output) -> anyhow::Result<()> {
    let records = read_records(file).await?;
    if records.is_empty() {
        warn!("No records to ingest");
    }
    let acks = store.ingest().process_batch(records).await?;
    out.value(&acks, || format!("Acknowledged {} records.", acks.len()))
}

fn parse_document(data: &str) -> anyhow::Result<serde_json::Value> {
    serde_json::from_str(data).context("Node data must be valid JSON")
}

async fn cmd_node(store: &GraphStore, action: NodeAction, out: Output) -> anyhow::Result<()> {
    let namespace = store.engine.config().namespace.as_str();
    match action {
        NodeAction::Get { id } => match store.nodes.get(namespace, &id).await? {
            Some(document) => out.document(&document),
            None => Err(anyhow::anyhow!("Node '{}' not found in namespace '{}'.", id, namespace)),
        },
        NodeAction::Set { id, data } => {
            let document = parse_document(&data)?;
            store.nodes.set(namespace, &id, document.clone()).await?;
            out.document(&document)
        }
        NodeAction::Patch { id, data } => {
            let merged = store.nodes.patch(namespace, &id, parse_document(&data)?).await?;
            out.document(&merged)
        }
    }
}

fn cmd_config(action: ConfigAction, out: Output) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !out.quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            if out.format == OutputFormat::Json {
                let map: serde_json::Map<String, serde_json::Value> = items
                    .into_iter()
                    .map(|(key, value)| (key, serde_json::Value::String(value)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                for (key, value) in items {
                    println!("{} = {}", key, value);
                }
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !out.quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(config: &Config, out: Output) -> anyhow::Result<()> {
    if !out.quiet {
        println!("Affinity Health Check");
        println!("=====================");
        println!();
    }

    let mut all_ok = true;

    match config.validate() {
        Ok(()) => out.check(true, &format!("Configuration: Valid (backend: {})", config.backend.kind)),
        Err(e) => {
            all_ok = false;
            out.check(false, &format!("Configuration: {}", e));
        }
    }

    match GraphStore::open(config).await {
        Ok(store) => {
            match &store.database {
                Some(database) => match database.migration_status().await {
                    Ok(status) => out.check(
                        !status.needs_migration,
                        &format!(
                            "Database: {} (schema v{})",
                            database.path().display(),
                            status.current_version
                        ),
                    ),
                    Err(e) => {
                        all_ok = false;
                        out.check(false, &format!("Database: {:#}", e));
                    }
                },
                None => out.check(true, "Storage: in-memory range store"),
            }
            store.close().await;
        }
        Err(e) => {
            all_ok = false;
            out.check(false, &format!("Storage: {}", e));
            if let Some(suggestion) = e.suggestion() {
                out.check(false, &format!("Try: {}", suggestion));
            }
        }
    }

    if !out.quiet {
        println!();
        if all_ok {
            println!("All checks passed.");
        } else {
            println!("Some checks failed.");
        }
    }
    if all_ok {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Health check failed"))
    }
}

// ============================================================================
// Output
// ============================================================================

#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    fn json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn value<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => self.json(value),
            OutputFormat::Text => {
                println!("{}", text());
                Ok(())
            }
        }
    }

    fn edges(&self, edges: &[Edge]) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(edges);
        }
        if edges.is_empty() {
            if !self.quiet {
                println!("No edges found.");
            }
            return Ok(());
        }
        for edge in edges {
            println!("{}", format_edge(edge));
        }
        Ok(())
    }

    fn removed(&self, edges: &[Edge]) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(edges);
        }
        if !self.quiet {
            println!("Removed {} records.", edges.len());
        }
        for edge in edges {
            println!("{}", format_edge(edge));
        }
        Ok(())
    }

    fn traversal(&self, result: &TraversalResult) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(result);
        }
        if result.paths.is_empty() {
            if !self.quiet {
                println!("No paths found.");
            }
            return Ok(());
        }
        if !self.quiet {
            println!("Paths:");
        }
        for path in &result.paths {
            let nodes: Vec<&str> = path.nodes().collect();
            println!("  {}  ({})", nodes.join(" -> "), path.distance);
        }
        if !self.quiet {
            println!("\nVisits:");
            for (node, count) in &result.frequency.total {
                println!("  {} = {}", node, count);
            }
        }
        Ok(())
    }

    fn document(&self, document: &serde_json::Value) -> anyhow::Result<()> {
        // documents are JSON in both formats
        println!("{}", serde_json::to_string_pretty(document)?);
        Ok(())
    }

    fn check(&self, ok: bool, message: &str) {
        if !self.quiet {
            println!("[{}] {}", if ok { "OK" } else { "!!" }, message);
        }
    }
}

fn format_edge(edge: &Edge) -> String {
    format!(
        "  {} -[{}:{}]- {}  {}",
        edge.from_node, edge.entity, edge.direction, edge.to_node, edge.distance
    )
}
