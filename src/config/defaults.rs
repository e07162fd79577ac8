//! System-wide default constants.
//!
//! Centralises magic numbers for the ingestion, query and narrative paths.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Storage
// ============================================================================

/// Sled database directory.
pub const DATA_DIR: &str = "./data/welllog.db";

/// Directory receiving raw uploaded LAS files.
pub const RAW_DIR: &str = "./data/raw";

// ============================================================================
// Ingestion
// ============================================================================

/// Rows written per batch inside the ingestion transaction.
pub const ROW_BATCH_SIZE: usize = 500;

/// Largest accepted upload (bytes). 50 MiB.
pub const MAX_FILE_BYTES: usize = 50 * 1024 * 1024;

// ============================================================================
// Aggregation
// ============================================================================

/// Curves evaluated concurrently per aggregation batch.
pub const AGGREGATION_BATCH_WIDTH: usize = 5;

/// Maximum time a single curve's statistics may take before it is dropped (seconds).
pub const CURVE_STATS_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Context Cache
// ============================================================================

/// Lifetime of a cached well context (seconds). 300 = 5 minutes.
pub const CONTEXT_TTL_SECS: u64 = 300;

/// Depth-ordered rows included in a well context.
pub const CONTEXT_SAMPLE_ROWS: usize = 10;

// ============================================================================
// Interpretation
// ============================================================================

/// Maximum downsampled rows handed to the interpretation prompt.
pub const INTERPRETATION_MAX_SAMPLE_ROWS: usize = 60;

// ============================================================================
// Chat
// ============================================================================

/// Conversation entries retained per session (user + assistant turns).
pub const CHAT_HISTORY_LIMIT: usize = 10;

/// Most recent history entries included in a chat prompt.
pub const CHAT_PROMPT_HISTORY: usize = 6;

/// Curves listed in the compact statistics digest.
pub const DIGEST_CURVES: usize = 10;

/// Curves named in the well summary before truncating with "...".
pub const SUMMARY_CURVES: usize = 8;
