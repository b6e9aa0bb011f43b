//! Exit code constants for the promptgen CLI.
//!
//! - 0: Success
//! - 1: User error (bad arguments, invalid config)
//! - 2: Document error (missing, malformed, or reserved-token misuse)
//! - 3: Import error (missing source, duplicate keys, bad multi-part shape)
//! - 4: Resolution error (selectors, chunks, unresolved placeholders)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or an invalid configuration file.
pub const USER_ERROR: i32 = 1;

/// Document error: a template, chunk, or prompt file could not be parsed.
pub const DOCUMENT_FAILURE: i32 = 2;

/// Import error: a variation source could not be loaded or merged.
pub const IMPORT_FAILURE: i32 = 3;

/// Resolution error: template expansion or prompt generation failed.
pub const RESOLUTION_FAILURE: i32 = 4;
