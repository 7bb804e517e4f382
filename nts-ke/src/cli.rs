use crate::daemon_tracing::LogLevel;
use std::path::PathBuf;
use std::str::FromStr;

const USAGE_MSG: &str = "\
usage: nts-ke [-c PATH] [-l LOG_LEVEL] [SERVER[:PORT]]
       nts-ke -h
       nts-ke -v";

const DESCRIPTOR: &str = "nts-ke - perform an NTS key exchange";

const HELP_MSG: &str = "Options:
  -c, --config=PATH             change the config .toml file
  -l, --log-level=LOG_LEVEL     change the log level
  -h, --help                    display this help text
  -v, --version                 display version information

SERVER overrides the key exchange server from the config file. Without a
port, 4460 is used.";

pub fn long_help_message() -> String {
    format!("{DESCRIPTOR}\n\n{USAGE_MSG}\n\n{HELP_MSG}")
}

#[derive(Debug, Default)]
pub(crate) struct NtsKeOptions {
    /// Path of the configuration file
    pub config: Option<PathBuf>,
    /// Level for messages to display in logs
    pub log_level: Option<LogLevel>,
    /// Key exchange server given on the command line
    pub server: Option<String>,
    help: bool,
    version: bool,
    pub action: NtsKeAction,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum NtsKeAction {
    #[default]
    Help,
    Version,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliOption {
    Config,
    LogLevel,
    Help,
    Version,
}

impl CliOption {
    fn from_short(option: char) -> Result<Self, String> {
        match option {
            'c' => Ok(Self::Config),
            'l' => Ok(Self::LogLevel),
            'h' => Ok(Self::Help),
            'v' => Ok(Self::Version),
            _ => Err(format!("invalid option: '-{option}'")),
        }
    }

    fn from_long(name: &str) -> Result<Self, String> {
        match name {
            "config" => Ok(Self::Config),
            "log-level" => Ok(Self::LogLevel),
            "help" => Ok(Self::Help),
            "version" => Ok(Self::Version),
            _ => Err(format!("invalid option: '--{name}'")),
        }
    }

    fn takes_value(self) -> bool {
        matches!(self, Self::Config | Self::LogLevel)
    }
}

impl NtsKeOptions {
    /// parse an iterator over command line arguments
    pub fn try_parse_from<I, T>(iter: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut options = NtsKeOptions::default();
        // the first argument is the nts-ke command - so we can skip it
        let mut args = iter.into_iter().skip(1).map(|arg| arg.as_ref().to_string());
        let mut positional = vec![];

        while let Some(arg) = args.next() {
            if arg == "--" {
                positional.extend(args.by_ref());
                break;
            }

            if let Some(long) = arg.strip_prefix("--") {
                // --config=/path/to/config.toml or --config /path/to/config.toml
                let (name, inline) = match long.split_once('=') {
                    Some((name, value)) => (name, Some(value.to_string())),
                    None => (long, None),
                };
                let option = CliOption::from_long(name)?;

                let value = match inline {
                    Some(_) if !option.takes_value() => {
                        return Err(format!("'--{name}' does not take an argument"));
                    }
                    None if option.takes_value() => Some(
                        args.next()
                            .ok_or_else(|| format!("'--{name}' expects an argument"))?,
                    ),
                    value => value,
                };
                options.set(option, value)?;
            } else if let Some(cluster) = arg.strip_prefix('-').filter(|c| !c.is_empty()) {
                // combined shorthand options, the first one taking a value ends the cluster
                for (index, short) in cluster.char_indices() {
                    let option = CliOption::from_short(short)?;
                    if !option.takes_value() {
                        options.set(option, None)?;
                        continue;
                    }

                    let rest = &cluster[index + short.len_utf8()..];
                    // assignment syntax is not accepted for shorthand arguments
                    if rest.starts_with('=') {
                        return Err(format!("invalid option: '-{short}='"));
                    }
                    let value = match rest {
                        "" => args
                            .next()
                            .ok_or_else(|| format!("'-{short}' expects an argument"))?,
                        rest => rest.to_string(),
                    };
                    options.set(option, Some(value))?;
                    break;
                }
            } else {
                positional.push(arg);
            }
        }

        match positional.as_slice() {
            [] => {}
            [server] => options.server = Some(server.clone()),
            [_, unexpected, ..] => return Err(format!("unexpected argument: {unexpected}")),
        }

        options.resolve_action();

        Ok(options)
    }

    fn set(&mut self, option: CliOption, value: Option<String>) -> Result<(), String> {
        match (option, value) {
            (CliOption::Config, Some(path)) => self.config = Some(PathBuf::from(path)),
            (CliOption::LogLevel, Some(level)) => match LogLevel::from_str(&level) {
                Ok(level) => self.log_level = Some(level),
                Err(_) => return Err(format!("invalid log level: {level}")),
            },
            (CliOption::Help, _) => self.help = true,
            (CliOption::Version, _) => self.version = true,
            (option, None) => return Err(format!("{option:?} expects an argument")),
        }

        Ok(())
    }

    /// from the arguments resolve which action should be performed
    fn resolve_action(&mut self) {
        if self.help {
            self.action = NtsKeAction::Help;
        } else if self.version {
            self.action = NtsKeAction::Version;
        } else {
            self.action = NtsKeAction::Run;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINARY: &str = "/usr/bin/nts-ke";

    #[test]
    fn cli_config() {
        let config_str = "/foo/bar/nts-ke.toml";
        let config = Some(PathBuf::from(config_str));

        let arguments = &[BINARY, "-c", config_str];
        let options = NtsKeOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.config, config);
        assert_eq!(options.action, NtsKeAction::Run);

        let arguments = &[BINARY, "--config", config_str];
        let options = NtsKeOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.config, config);

        let arguments = &[BINARY, "--config=/foo/bar/nts-ke.toml"];
        let options = NtsKeOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.config, config);

        let arguments = &[BINARY, "-c/foo/bar/nts-ke.toml"];
        let options = NtsKeOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.config, config);

        let arguments = &[BINARY, "-c=/foo/bar/nts-ke.toml"];
        assert!(NtsKeOptions::try_parse_from(arguments).is_err());

        let arguments = &[BINARY, "--config"];
        assert!(NtsKeOptions::try_parse_from(arguments).is_err());
    }

    #[test]
    fn cli_log_level() {
        let arguments = &[BINARY, "-l", "debug"];
        let options = NtsKeOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.log_level, Some(LogLevel::Debug));

        let arguments = &[BINARY, "--log-level=error"];
        let options = NtsKeOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.log_level, Some(LogLevel::Error));

        let arguments = &[BINARY, "-l", "chatty"];
        assert!(NtsKeOptions::try_parse_from(arguments).is_err());
    }

    #[test]
    fn cli_server() {
        let arguments = &[BINARY, "time.example.com"];
        let options = NtsKeOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.server.as_deref(), Some("time.example.com"));
        assert_eq!(options.action, NtsKeAction::Run);

        let arguments = &[BINARY, "-l", "warn", "[2001:db8::1]:4461"];
        let options = NtsKeOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.server.as_deref(), Some("[2001:db8::1]:4461"));
        assert_eq!(options.log_level, Some(LogLevel::Warn));

        let arguments = &[BINARY, "--", "-odd-host-name"];
        let options = NtsKeOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.server.as_deref(), Some("-odd-host-name"));

        let arguments = &[BINARY, "one.example.com", "two.example.com"];
        assert!(NtsKeOptions::try_parse_from(arguments).is_err());

        let arguments = &[BINARY];
        let options = NtsKeOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.server, None);
        assert_eq!(options.action, NtsKeAction::Run);
    }

    #[test]
    fn cli_actions() {
        let options = NtsKeOptions::try_parse_from([BINARY, "-h"]).unwrap();
        assert_eq!(options.action, NtsKeAction::Help);

        let options = NtsKeOptions::try_parse_from([BINARY, "--version"]).unwrap();
        assert_eq!(options.action, NtsKeAction::Version);

        // help wins over version
        let options = NtsKeOptions::try_parse_from([BINARY, "-vh"]).unwrap();
        assert_eq!(options.action, NtsKeAction::Help);

        assert!(NtsKeOptions::try_parse_from([BINARY, "--frobnicate"]).is_err());
        assert!(NtsKeOptions::try_parse_from([BINARY, "-x"]).is_err());
    }

    #[test]
    fn cli_multibyte_short_options() {
        // slicing after a multi-byte option must stay on a char boundary
        assert!(NtsKeOptions::try_parse_from(["nts-ke", "-ééc", "x"]).is_err());
        assert!(NtsKeOptions::try_parse_from(["nts-ke", "-vé"]).is_err());

        let options = NtsKeOptions::try_parse_from(["nts-ke", "-cé.toml"]).unwrap();
        assert_eq!(options.config, Some(PathBuf::from("é.toml")));

        let options = NtsKeOptions::try_parse_from(["nts-ke", "-vlwarn", "ñtp.example"]).unwrap();
        assert_eq!(options.log_level, Some(LogLevel::Warn));
        assert_eq!(options.server.as_deref(), Some("ñtp.example"));
        assert_eq!(options.action, NtsKeAction::Version);
    }

    #[test]
    fn cli_flags_reject_values() {
        assert!(NtsKeOptions::try_parse_from([BINARY, "--help=yes"]).is_err());
        assert!(NtsKeOptions::try_parse_from([BINARY, "-l"]).is_err());
        assert!(NtsKeOptions::try_parse_from([BINARY, "--log-level"]).is_err());
    }
}
