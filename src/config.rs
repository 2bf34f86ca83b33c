//! Bring-up configuration flags.
//!
//! The flags mirror the `xepci=` boot-argument grammar
//! (`verbose,noforcewake,nocs,strictsafe`), but the parsed value is passed
//! explicitly into [`crate::device::XeDevice::open`] rather than living in a
//! process-wide singleton. Acquiring the flag string from the boot environment
//! is the host adapter's job.

/// Safe-mode switches honored by the bring-up core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BringupConfig {
    /// Emit extra diagnostics.
    pub verbose: bool,
    /// Never assert forcewake; dependent reads are best-effort/stale.
    pub disable_forcewake: bool,
    /// Refuse all command-stream operations with `NotReady`.
    pub disable_command_stream: bool,
    /// Strict safe mode; implies both disables.
    pub strict_safe: bool,
}

impl BringupConfig {
    /// Forcewake suppressed, either directly or via strict safe mode.
    /// Consumers must go through this rather than reading the field, so a
    /// hand-built config with only `strict_safe` set still gets the
    /// implication.
    pub fn forcewake_disabled(&self) -> bool {
        self.disable_forcewake || self.strict_safe
    }

    /// Command-stream operations suppressed, either directly or via strict
    /// safe mode.
    pub fn command_stream_disabled(&self) -> bool {
        self.disable_command_stream || self.strict_safe
    }

    /// Parse a comma-separated flag string. Unknown tokens are ignored,
    /// matching the original boot-arg parser.
    pub fn parse(args: &str) -> Self {
        let mut cfg = Self::default();
        for token in args.split(',') {
            let token = token.trim();
            if token.eq_ignore_ascii_case("verbose") {
                cfg.verbose = true;
            } else if token.eq_ignore_ascii_case("noforcewake") {
                cfg.disable_forcewake = true;
            } else if token.eq_ignore_ascii_case("nocs") {
                cfg.disable_command_stream = true;
            } else if token.eq_ignore_ascii_case("strictsafe") {
                cfg.strict_safe = true;
                cfg.disable_forcewake = true;
                cfg.disable_command_stream = true;
            }
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_is_default() {
        assert_eq!(BringupConfig::parse(""), BringupConfig::default());
    }

    #[test]
    fn test_parse_individual_flags() {
        let cfg = BringupConfig::parse("verbose,nocs");
        assert!(cfg.verbose);
        assert!(cfg.disable_command_stream);
        assert!(!cfg.disable_forcewake);
        assert!(!cfg.strict_safe);
    }

    #[test]
    fn test_strictsafe_implies_both_disables() {
        let cfg = BringupConfig::parse("strictsafe");
        assert!(cfg.strict_safe);
        assert!(cfg.disable_forcewake);
        assert!(cfg.disable_command_stream);
    }

    #[test]
    fn test_strictsafe_implies_disables_when_built_directly() {
        let cfg = BringupConfig {
            strict_safe: true,
            ..BringupConfig::default()
        };
        assert!(cfg.forcewake_disabled());
        assert!(cfg.command_stream_disabled());
        let cfg = BringupConfig::default();
        assert!(!cfg.forcewake_disabled());
        assert!(!cfg.command_stream_disabled());
    }

    #[test]
    fn test_parse_ignores_unknown_tokens_and_whitespace() {
        let cfg = BringupConfig::parse(" verbose , bogus,NOFORCEWAKE");
        assert!(cfg.verbose);
        assert!(cfg.disable_forcewake);
        assert!(!cfg.disable_command_stream);
    }
}
