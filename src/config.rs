//! Runtime configuration applied at warm-up.

use crate::error::TerminationMode;

/// Process-wide runtime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub termination_mode: TerminationMode,
    pub print_backtrace: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            termination_mode: TerminationMode::Unwind,
            print_backtrace: false,
        }
    }
}

impl RuntimeConfig {
    /// Reads `EIDOS_TERMINATE` (`exit` or `unwind`) and `EIDOS_BACKTRACE` (`0` or `1`).
    /// Unset or unrecognized values keep the defaults.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("EIDOS_TERMINATE").ok().as_deref(),
            std::env::var("EIDOS_BACKTRACE").ok().as_deref(),
        )
    }

    pub fn from_vars(terminate: Option<&str>, backtrace: Option<&str>) -> Self {
        let mut config = Self::default();

        match terminate.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("exit") => config.termination_mode = TerminationMode::Exit,
            Some("unwind") => config.termination_mode = TerminationMode::Unwind,
            Some(other) => {
                tracing::warn!(value = other, "ignoring unrecognized EIDOS_TERMINATE")
            }
            None => {}
        }

        match backtrace.map(str::trim) {
            Some("1") | Some("true") => config.print_backtrace = true,
            Some("0") | Some("false") => config.print_backtrace = false,
            Some(other) => {
                tracing::warn!(value = other, "ignoring unrecognized EIDOS_BACKTRACE")
            }
            None => {}
        }

        config
    }

    pub fn with_termination_mode(mut self, mode: TerminationMode) -> Self {
        self.termination_mode = mode;
        self
    }

    pub fn with_backtrace(mut self, enabled: bool) -> Self {
        self.print_backtrace = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_unwinds() {
        let config = RuntimeConfig::default();
        assert_eq!(config.termination_mode, TerminationMode::Unwind);
        assert!(!config.print_backtrace);
    }

    #[test]
    fn test_from_vars() {
        let config = RuntimeConfig::from_vars(Some("EXIT"), Some("1"));
        assert_eq!(config.termination_mode, TerminationMode::Exit);
        assert!(config.print_backtrace);

        let config = RuntimeConfig::from_vars(Some("sometimes"), Some("maybe"));
        assert_eq!(config, RuntimeConfig::default());

        assert_eq!(RuntimeConfig::from_vars(None, None), RuntimeConfig::default());
    }

    #[test]
    fn test_builders() {
        let config = RuntimeConfig::default()
            .with_termination_mode(TerminationMode::Exit)
            .with_backtrace(true);
        assert_eq!(
            config,
            RuntimeConfig {
                termination_mode: TerminationMode::Exit,
                print_backtrace: true,
            }
        );
    }
}
