//! Application constants for the plate merger
//!
//! Fixed line/field offsets of the plate readout layout and the naming
//! conventions used to pair completion re-reads with their primary plate.

// =============================================================================
// Plate Readout Layout
// =============================================================================

/// Offsets index the sequence of trimmed, non-blank lines (zero-based)
pub mod layout {
    /// Field separator inside a readout line
    pub const FIELD_SEPARATOR: char = '\t';

    /// Line holding the plate name
    pub const PLATE_NAME_LINE: usize = 3;

    /// Field of the plate name line holding the name itself
    pub const PLATE_NAME_FIELD: usize = 1;

    /// Line holding the column headers
    pub const COLUMNS_LINE: usize = 7;

    /// First data row
    pub const DATA_START_LINE: usize = 8;

    /// Minimum number of non-blank lines for a readable plate
    pub const MIN_LINES: usize = COLUMNS_LINE + 1;

    /// Number of leading fields forming a row's identity
    pub const ROW_KEY_FIELDS: usize = 4;
}

// =============================================================================
// Completion Naming
// =============================================================================

/// Whitespace-bounded run of the run marker, e.g. the " I " in "Plate I 1"
pub const COMPLETION_MARKER_PATTERN: &str = r"\sI+\s";

/// Replacement used when normalizing a completion name back to its primary
pub const COMPLETION_MARKER_REPLACEMENT: &str = " ";

// =============================================================================
// Output Layout
// =============================================================================

/// Directory inside a bundle holding the per-plate tables
pub const BUNDLE_PLATES_DIR: &str = "plates";

/// Header of the synthetic row-index column in the aggregate table
pub const ROW_INDEX_COLUMN: &str = "";

/// Prefix for naming blank header cells, followed by the column position
pub const UNNAMED_COLUMN_PREFIX: &str = "Unnamed: ";

/// Workspace sub-directory receiving extracted upload contents
pub const EXTRACTED_DIR_NAME: &str = "extracted";

/// Workspace sub-directory receiving pipeline output
pub const OUTPUT_DIR_NAME: &str = "output";

/// Timestamp prefix format for workspace directory names
pub const WORKSPACE_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.3fZ";
