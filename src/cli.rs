//! Command-line surface.
//!
//! Flags are spelled Go-style (`-port 9090`, `-no-auth`); the usual
//! `--port` form works too. [`normalize_args`] rewrites the single-dash
//! spelling of known flags before clap sees them.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::builder::{OsStringValueParser, TypedValueParser};
use clap::Parser;

use crate::config::Overrides;
use crate::controller::HardwareCapabilities;

/// Long flags that may be written with a single dash.
const LONG_FLAGS: &[&str] = &[
    "config", "port", "no-auth", "pwm", "adc", "high", "version", "help",
];

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "reefpi",
    about = "Aquarium controller daemon",
    disable_version_flag = true
)]
pub struct Cli {
    /// Configuration file path (empty means built-in defaults)
    #[arg(
        long,
        value_name = "PATH",
        value_parser = OsStringValueParser::new().map(PathBuf::from)
    )]
    pub config: Option<PathBuf>,

    /// Network port to bind to [default: 8080]
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Disable authentication
    #[arg(long = "no-auth")]
    pub no_auth: bool,

    /// Enable pulse width modulation (PCA9685)
    #[arg(long)]
    pub pwm: bool,

    /// Enable analog to digital conversion (MCP3008)
    #[arg(long)]
    pub adc: bool,

    /// Relays are energized by a high GPIO level
    #[arg(long)]
    pub high: bool,

    /// Print version information
    #[arg(long)]
    pub version: bool,
}

impl Cli {
    /// Parse an argument vector (program name first).
    pub fn parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// Config path, treating `-config ""` as absent.
    pub fn config_path(&self) -> Option<&Path> {
        self.config
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    pub fn capabilities(&self) -> HardwareCapabilities {
        HardwareCapabilities {
            pwm_enabled: self.pwm,
            adc_enabled: self.adc,
            relay_active_high: self.high,
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            no_auth: self.no_auth,
        }
    }
}

/// Rewrite `-flag` / `-flag=value` to `--flag` for every known long flag.
///
/// Everything after a bare `--` is left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .enumerate()
        .map(|(index, arg)| {
            if index == 0 || passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
                    if LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{text}"))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["reefpi"];
        argv.extend_from_slice(args);
        Cli::parse_args(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.config_path(), None);
        assert_eq!(cli.overrides(), Overrides::default());
        assert_eq!(cli.capabilities(), HardwareCapabilities::default());
        assert!(!cli.version);
    }

    #[test]
    fn go_style_flags() {
        let cli = parse(&["-port", "9090", "-pwm", "-no-auth"]);
        assert_eq!(cli.port, Some(9090));
        assert!(cli.no_auth);
        assert_eq!(
            cli.capabilities(),
            HardwareCapabilities {
                pwm_enabled: true,
                adc_enabled: false,
                relay_active_high: false,
            }
        );
    }

    #[test]
    fn equals_and_double_dash_forms() {
        let cli = parse(&["-config=/etc/reefpi.toml", "--adc", "-high"]);
        assert_eq!(cli.config_path(), Some(Path::new("/etc/reefpi.toml")));
        assert!(cli.adc);
        assert!(cli.high);
    }

    #[test]
    fn empty_config_is_absent() {
        let cli = parse(&["-config", ""]);
        assert_eq!(cli.config_path(), None);
    }

    #[test]
    fn version_flag() {
        assert!(parse(&["-version"]).version);
    }

    #[test]
    fn unknown_flag_rejected() {
        assert!(Cli::parse_args(["reefpi", "-bogus"]).is_err());
        assert!(Cli::parse_args(["reefpi", "-port", "eighty"]).is_err());
    }

    #[test]
    fn rewriting_stops_at_separator() {
        let args = normalize_args(["reefpi", "-config", "-pwm"]);
        assert_eq!(args[1], OsString::from("--config"));
        assert_eq!(args[2], OsString::from("--pwm"));

        let args = normalize_args(["reefpi", "--", "-pwm"]);
        assert_eq!(args[2], OsString::from("-pwm"));
    }
}
