//! Command line client for Network Time Security key establishment.
//!
//! Connects to a key exchange server, negotiates NTPv4 with
//! AES-SIV-CMAC-256 and reports the NTP server and cookie count to use.

#![forbid(unsafe_code)]

mod cli;
mod config;
pub mod keyexchange;
mod tracing;

use std::path::PathBuf;

use cli::NtsKeOptions;
use config::Config;
use nts_ke_proto::NegotiatedData;

use crate::tracing as daemon_tracing;
use daemon_tracing::LogLevel;
use tracing_subscriber::util::SubscriberInitExt;

pub(crate) mod exitcode {
    /// An internal software error has been detected.  This
    /// should be limited to non-operating system related
    /// errors as possible.
    pub const SOFTWARE: i32 = 70;

    /// Something was found in an unconfigured or misconfigured state.
    pub const CONFIG: i32 = 78;
}

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn nts_ke_main() -> Result<(), Box<dyn std::error::Error>> {
    let options = NtsKeOptions::try_parse_from(std::env::args())?;

    match options.action {
        cli::NtsKeAction::Help => {
            println!("{}", cli::long_help_message());
        }
        cli::NtsKeAction::Version => {
            eprintln!("nts-ke {VERSION}");
        }
        cli::NtsKeAction::Run => run(options).await?,
    }

    Ok(())
}

// initializes the logger so that logs during config parsing are reported. Then it overrides the
// log level based on the config if required.
pub(crate) async fn initialize_logging_parse_config(
    initial_log_level: Option<LogLevel>,
    config_path: Option<PathBuf>,
) -> Config {
    let mut log_level = initial_log_level.unwrap_or_default();

    let config_tracing = daemon_tracing::tracing_init(log_level);
    let config = ::tracing::subscriber::with_default(config_tracing, || {
        async {
            match config_path {
                None => Config::default(),
                Some(config_path) => {
                    match Config::from_args(config_path).await {
                        Ok(c) => c,
                        Err(e) => {
                            // print to stderr because tracing is not yet setup
                            eprintln!("There was an error loading the config: {e}");
                            std::process::exit(exitcode::CONFIG);
                        }
                    }
                }
            }
        }
    })
    .await;

    if let Some(config_log_level) = config.observability.log_level {
        if initial_log_level.is_none() {
            log_level = config_log_level;
        }
    }

    // set a default global subscriber from now on
    let tracing_inst = daemon_tracing::tracing_init(log_level);
    tracing_inst.init();

    config
}

async fn run(options: NtsKeOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = initialize_logging_parse_config(options.log_level, options.config).await;

    // give the user a warning that we use the command line option
    if config.observability.log_level.is_some() && options.log_level.is_some() {
        ::tracing::info!("Log level override from command line arguments is active");
    }

    // Warn if the config is unreasonable. We do this after finishing
    // tracing setup to ensure logging is fully configured.
    config.check();

    let Some(server) = options.server.or(config.nts_ke.server.clone()) else {
        eprintln!("no key exchange server specified\n\n{}", cli::long_help_message());
        std::process::exit(exitcode::CONFIG);
    };

    let roots = match keyexchange::root_certificates(&config.nts_ke.certificate_authority_paths) {
        Ok(roots) => roots,
        Err(e) => {
            ::tracing::error!("Could not load certificate authorities: {e}");
            std::process::exit(exitcode::CONFIG);
        }
    };
    let tls_config = keyexchange::client_config(roots);

    let result =
        keyexchange::key_exchange_client(&server, tls_config, config.nts_ke.connect_timeout())
            .await;

    match result {
        Ok(data) => {
            ::tracing::info!(%server, "key exchange completed");
            println!("{}", format_result(&data));
            Ok(())
        }
        Err(e) => {
            ::tracing::error!("Key exchange with {server} failed: {e}");
            std::process::exit(exitcode::SOFTWARE)
        }
    }
}

fn format_result(data: &NegotiatedData) -> String {
    let algorithm = match data.algorithm {
        Some(algorithm) => algorithm.to_string(),
        None => String::from("none"),
    };

    format!(
        "server: {}\nport: {}\nalgorithm: {}\ncookies: {}",
        data.server,
        data.port,
        algorithm,
        data.cookies.len()
    )
}

#[cfg(test)]
mod tests {
    use nts_ke_proto::{AeadAlgorithm, SessionKey};

    use super::*;

    #[test]
    fn test_format_result() {
        let mut data = NegotiatedData::new("192.0.2.1");
        data.cookies = vec![vec![1, 2, 3]; 8];
        data.algorithm = Some(AeadAlgorithm::AeadAesSivCmac256);
        data.c2s_key = Some(SessionKey::from_bytes([0x5a; 32]));

        let output = format_result(&data);
        assert_eq!(
            output,
            "server: 192.0.2.1\nport: 123\nalgorithm: AEAD_AES_SIV_CMAC_256\ncookies: 8"
        );

        data.algorithm = None;
        assert!(format_result(&data).contains("algorithm: none"));
    }
}
