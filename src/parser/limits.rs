//! Implementation limits for decoding and execution.
//!
//! Counts read from the binary are checked against these before anything is
//! allocated, so a malformed module cannot claim unrealistic sizes.

// =============================================================================
// Module-level limits
// =============================================================================

/// Maximum number of type definitions in a module
pub const MAX_TYPES: u32 = 100_000;

/// Maximum number of defined functions in a module
pub const MAX_FUNCTIONS: u32 = 100_000;

/// Maximum number of data segments in a module
pub const MAX_DATA_SEGMENTS: u32 = 100_000;

// =============================================================================
// Function-level limits
// =============================================================================

/// Maximum function body size in bytes
pub const MAX_FUNCTION_SIZE: u32 = 7_654_321;

/// Maximum number of function parameters
pub const MAX_FUNCTION_PARAMS: u32 = 1_000;

/// Maximum number of function results. Multi-value is not supported.
pub const MAX_FUNCTION_RESULTS: u32 = 1;

/// Maximum number of local variables in a function, excluding parameters
pub const MAX_FUNCTION_LOCALS: u32 = 50_000;

// =============================================================================
// Memory limits
// =============================================================================

/// Page ceiling for linear memory: 128 pages of 64 KiB, 8 MiB in total.
pub const MAX_PAGES: u32 = 128;

// =============================================================================
// Execution limits
// =============================================================================

/// Maximum depth of the call stack, counting the entry frame
pub const MAX_CALL_DEPTH: usize = 10_000;

/// Maximum number of local slots (parameters plus declared locals) held by
/// all live frames together: 4 MiB of i32 values
pub const MAX_TOTAL_LOCALS: usize = 1 << 20;
