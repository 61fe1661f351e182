use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "db-editor",
    about = "Edit a relational database's contents as a hierarchical JSON document",
    version,
    after_help = "Examples:\n  db-editor dump --db postgres://localhost/myapp --output data.json\n  db-editor preview --db postgres://localhost/myapp data.json\n  db-editor sync --db postgres://localhost/myapp data.json\n  db-editor reset --db postgres://localhost/myapp data.json\n  db-editor check --db postgres://localhost/myapp\n  db-editor graph --db postgres://localhost/myapp --format mermaid"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dump the live database to a JSON document plus a base snapshot
    Dump(DumpArgs),

    /// Show the change set a sync would apply, without touching the database
    Preview(PreviewArgs),

    /// Three-way sync: apply the edited file's changes relative to the base snapshot
    Sync(SyncArgs),

    /// Two-way reset: make the database match the edited file exactly
    Reset(ResetArgs),

    /// Report structural schema drift against the last dump's schema companion
    Check(CheckArgs),

    /// Render the table ownership/dependency graph
    Graph(GraphArgs),

    /// Introspect a database schema and display analysis
    Introspect(IntrospectArgs),
}

#[derive(Parser, Debug)]
pub struct DumpArgs {
    /// Database connection URL. Falls back to DATABASE_URL, then db-editor.toml
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Schema namespace to introspect (default: public)
    #[arg(long)]
    pub schema: Option<String>,

    /// Where to write the user-facing document
    #[arg(short, long, default_value = "data.json")]
    pub output: PathBuf,

    /// Write flat layout instead of the default nested layout
    #[arg(long)]
    pub flat: bool,

    /// Cap each root table's row count in the user-facing document
    #[arg(long)]
    pub limit: Option<usize>,

    /// Cap each nested child sequence's row count
    #[arg(long)]
    pub nested_limit: Option<usize>,

    /// Skip writing the sibling JSON-schema companion file
    #[arg(long)]
    pub no_schema_companion: bool,
}

#[derive(Parser, Debug)]
pub struct PreviewArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Schema namespace
    #[arg(long)]
    pub schema: Option<String>,

    /// The edited user-facing document
    pub input: PathBuf,
}

#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Schema namespace
    #[arg(long)]
    pub schema: Option<String>,

    /// The edited user-facing document
    pub input: PathBuf,

    /// Apply without an interactive confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct ResetArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Schema namespace
    #[arg(long)]
    pub schema: Option<String>,

    /// The edited user-facing document
    pub input: PathBuf,

    /// Apply without an interactive confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Schema namespace
    #[arg(long)]
    pub schema: Option<String>,

    /// Previously-dumped schema companion file to diff against
    /// (defaults to the sibling of --against-file)
    #[arg(long)]
    pub against: Option<PathBuf>,

    /// User-facing document whose sibling schema companion to diff against
    /// when --against is not given
    #[arg(long, default_value = "data.json")]
    pub against_file: PathBuf,

    /// Output format for the drift report
    #[arg(long, default_value = "text")]
    pub format: CheckFormat,
}

#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Schema namespace
    #[arg(long)]
    pub schema: Option<String>,

    /// Output format for the dependency graph
    #[arg(long, default_value = "mermaid")]
    pub format: GraphFormat,
}

#[derive(Parser, Debug)]
pub struct IntrospectArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Schema namespace
    #[arg(long)]
    pub schema: Option<String>,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: IntrospectFormat,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CheckFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum GraphFormat {
    Mermaid,
    Dot,
    Text,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum IntrospectFormat {
    Table,
    Json,
}
