pub mod config;
pub mod error;
pub mod hasher;
pub mod matcher;
pub mod merge;
pub mod model;
pub mod orchestrator;
pub mod platform;
pub mod progress;
pub mod scanner;
pub mod selection;

/// Name of the per-directory archive holding superseded file versions.
/// Never scanned, merged or removed.
pub const ARCHIVE_DIR_NAME: &str = ".merged";

pub use config::RunConfig;
pub use error::Error;
pub use hasher::HashCache;
pub use matcher::Matcher;
pub use merge::{MergeExecutor, MergePreview, MergeReport};
pub use model::{
    FileConflict, FolderRecord, MatchGroup, MatchReason, MergeOperationResult, MergeSelection,
    RunSummary,
};
pub use orchestrator::{Orchestrator, RunState, ScanReport};
pub use progress::{ProgressReporter, SilentReporter};
pub use selection::{MergeChoice, ReviewAction, SelectionHandler};
