//! CLI Exit Code Registry
//!
//! Single source of truth for `msift` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success (including an empty matching set)            |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad arguments, unknown filter key)      |
//! | 3    | No models found (no marker files in the selection)   |
//! | 4    | Unparseable path or title (strict mode)              |
//! | 5    | I/O error (directory, path list, terminal)           |
//! | 6    | Settings file could not be read, parsed or written   |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing input, unknown filter key.
pub const EXIT_USAGE: u8 = 2;

/// The selection contained no marker files.
pub const EXIT_NO_MODELS: u8 = 3;

/// A marker path had too few segments, or strict parsing rejected a title.
pub const EXIT_PARSE: u8 = 4;

/// Reading the directory, the path list, or driving the terminal failed.
pub const EXIT_IO: u8 = 5;

/// Settings file problem.
pub const EXIT_CONFIG: u8 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_NO_MODELS,
            EXIT_PARSE,
            EXIT_IO,
            EXIT_CONFIG,
        ];
        let unique: std::collections::HashSet<u8> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
