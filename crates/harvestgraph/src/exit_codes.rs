//! Exit codes for the harvestgraph binary.
//!
//! Exit codes communicate the outcome without requiring output parsing;
//! stderr carries the human-readable reason.

/// Stable exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Clean run; the operator quit.
    Clean = 0,

    /// No log directory resolvable and none was supplied.
    NoLogDir = 1,

    /// The renderer failed to initialize (e.g. not attached to a terminal).
    RendererInit = 2,

    /// Fatal I/O error while tailing the log.
    TailIo = 3,
}

impl ExitCode {
    /// Convert to i32 for `std::process::exit`.
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_a_stable_contract() {
        assert_eq!(ExitCode::Clean.code(), 0);
        assert_eq!(ExitCode::NoLogDir.code(), 1);
        assert_eq!(ExitCode::RendererInit.code(), 2);
        assert_eq!(ExitCode::TailIo.code(), 3);
    }
}
