//! System-wide constants for Vesta.
//!
//! These values size temporary tables and describe the physical record
//! layout shared by every storage representation.

// =============================================================================
// In-Memory Table Limits
// =============================================================================

/// Default capacity of an in-memory temporary table (16 MB).
///
/// Matches the usual `max_heap_table_size` default of SQL servers; once a
/// table grows past this it has to be moved to disk.
pub const DEFAULT_MAX_HEAP_TABLE_SIZE: usize = 16 * 1024 * 1024;

/// Smallest accepted in-memory table capacity (16 KB).
pub const MIN_HEAP_TABLE_SIZE: usize = 16 * 1024;

/// Bookkeeping bytes charged per row held in memory.
///
/// Covers the slot entry plus the position stored in any index.
pub const HEAP_ROW_OVERHEAD: usize = 16;

// =============================================================================
// Record Layout
// =============================================================================

/// Width of the hidden hash column appended to records when uniqueness
/// is enforced through a hash pseudo-key.
pub const HASH_COLUMN_WIDTH: usize = 8;

/// Length prefix written before each record in an on-disk table file.
pub const RECORD_LENGTH_PREFIX: usize = 4;

/// Largest single record accepted by any representation (64 MB).
pub const MAX_RECORD_SIZE: usize = 64 * 1024 * 1024;

// =============================================================================
// Index Limits
// =============================================================================

/// Default maximum width of a native unique key (3072 bytes).
///
/// Rows wider than this cannot be covered by a storage-native unique index
/// and fall back to a hash pseudo-key.
pub const DEFAULT_MAX_UNIQUE_KEY_LENGTH: usize = 3072;

/// Estimated encoded width of a variable-length column when sizing keys.
pub const VARIABLE_LENGTH_ESTIMATE: usize = 255;
