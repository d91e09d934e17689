//! Command-line and environment settings for the `fxsh` binary.

use std::path::PathBuf;

use clap::Parser;
use fxrun::convention::DEFAULT_SLACK;

pub const STORE_VAR: &str = "FXSH_STORE";
pub const SLACK_VAR: &str = "FXSH_SLACK";
pub const DEFAULT_STORE: &str = ".fxstore";

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "fxsh")]
#[command(about = "Deploy and call content-addressed functions")]
#[command(version)]
pub struct Settings {
    /// Directory backing the content store
    #[arg(long, env = STORE_VAR, default_value = DEFAULT_STORE)]
    pub store: PathBuf,

    /// Extra bytes requested from the guest allocator beyond the input
    #[arg(long, env = SLACK_VAR, default_value_t = DEFAULT_SLACK)]
    pub slack: u32,

    /// Script to run before the prompt
    pub script: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        Settings::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let s = Settings::try_parse_from(["fxsh"]).unwrap();
        assert_eq!(s.store, PathBuf::from(".fxstore"));
        assert_eq!(s.slack, DEFAULT_SLACK);
        assert_eq!(s.script, None);
    }

    #[test]
    fn test_overrides() {
        let s = Settings::try_parse_from(["fxsh", "--store", "/tmp/blobs", "--slack", "4096", "demo.fx"]).unwrap();
        assert_eq!(s.store, PathBuf::from("/tmp/blobs"));
        assert_eq!(s.slack, 4096);
        assert_eq!(s.script, Some(PathBuf::from("demo.fx")));
    }

    #[test]
    fn test_bad_slack() {
        let err = Settings::try_parse_from(["fxsh", "--slack", "lots"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_one_script_only() {
        let err = Settings::try_parse_from(["fxsh", "a.fx", "b.fx"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
