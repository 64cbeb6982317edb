//! Process exit codes, values taken from BSD sysexits.h.

pub const OK: i32 = 0;

/// Bad command line or missing input path
pub const USAGE: i32 = 64;

/// Malformed tag record, or `check` found relation issues
pub const DATAERR: i32 = 65;

/// Tag fetch or serialization failure
pub const SOFTWARE: i32 = 70;

/// Reading or writing a file failed
pub const IOERR: i32 = 74;

/// Config file missing or invalid
pub const CONFIG: i32 = 78;
