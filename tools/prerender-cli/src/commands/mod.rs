//! CLI command implementations.

pub mod classify;
pub mod gone;
pub mod render;
pub mod simulate;
pub mod tombstones;

use clap::Args;

/// A desktop browser, used when no user agent is given.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Request path (e.g. /job/senior-rust-engineer).
    pub path: String,

    /// User-Agent header value.
    #[arg(short = 'A', long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// HTTP method.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,
}

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// JSON file holding one job record (`-` for stdin).
    pub job: String,

    /// Write the document to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Leave out the tracking pixel.
    #[arg(long)]
    pub no_analytics: bool,
}

/// Arguments for the gone command.
#[derive(Args)]
pub struct GoneArgs {
    /// Tombstoned request path.
    pub path: String,

    /// Write the document to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Leave out the tracking pixel.
    #[arg(long)]
    pub no_analytics: bool,
}

/// Arguments for the tombstones command.
#[derive(Args)]
pub struct TombstonesArgs {
    /// Tombstone list file (`-` for stdin).
    pub file: String,

    /// Paths to check against the list.
    #[arg(long)]
    pub check: Vec<String>,
}

/// Arguments for the simulate command.
#[derive(Args)]
pub struct SimulateArgs {
    /// Request path.
    pub path: String,

    /// User-Agent header value.
    #[arg(short = 'A', long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// HTTP method.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// JSON file with an array of job records.
    #[arg(long)]
    pub jobs: Option<String>,

    /// Tombstone list file.
    #[arg(long)]
    pub tombstones: Option<String>,

    /// Delay every store lookup by this many milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Treat the store as unconfigured.
    #[arg(long)]
    pub no_store: bool,

    /// Print the response body.
    #[arg(long)]
    pub body: bool,
}
