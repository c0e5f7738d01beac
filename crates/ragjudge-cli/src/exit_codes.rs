//! Process exit codes. Part of the public contract for scripts and CI.

pub const SUCCESS: i32 = 0;
/// Reports were written, but the average final score is below `--min-score`.
pub const SCORE_BELOW_THRESHOLD: i32 = 1;
/// Config, credential, input or output failure; nothing or only partial output.
pub const CONFIG_ERROR: i32 = 2;
/// Interrupted with Ctrl-C; reports cover the rows completed before that.
pub const CANCELLED: i32 = 130;
