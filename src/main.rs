//! httping-probe - HTTP time-to-first-byte probe
//!
//! Measures a single URL a fixed number of times and prints one block of
//! latency metrics to stdout.

use clap::Parser;
use httping_probe::{
    cli::Cli,
    config::{display_config_summary, load_config, ConfigValidator, EnvManager, ValidationLevel},
    dns::{NameLookup, SystemLookup},
    error::{AppError, Result},
    log_debug,
    logging::LoggerFactory,
    output::MetricsEmitter,
    ProbeExecutor, VERSION,
};
use std::{io, process, sync::Arc};

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(AppError::internal("panic").exit_code());
    }));

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            // Printing can only fail when the terminal is gone
            let _ = e.print();
            process::exit(code);
        }
    };

    if cli.is_info_request() {
        if cli.version {
            print_version();
        } else {
            print!("{}", EnvManager::display_env_help());
        }
        return;
    }

    if let Err(e) = run_application(cli).await {
        process::exit(e.exit_code());
    }
}

fn print_version() {
    let binary = std::env::args()
        .next()
        .and_then(|arg0| {
            std::path::Path::new(&arg0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| httping_probe::PKG_NAME.to_string());

    println!("{} {}", binary, VERSION);
    println!(
        "Compiler: {} {}",
        option_env!("RUSTC_VERSION").unwrap_or("rustc unknown"),
        option_env!("TARGET_TRIPLE").unwrap_or("unknown")
    );
}

/// Main application logic. Errors are reported here; the caller only maps
/// them to an exit code.
async fn run_application(cli: Cli) -> Result<()> {
    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Hint: {}", suggestion);
            }
            return Err(e);
        }
    };

    if !config.enable_color {
        colored::control::set_override(false);
    }

    let factory = LoggerFactory::new(config.clone());
    let logger = factory.create_logger("main");

    log_debug!(logger, "Configuration loaded\n{}", display_config_summary(&config));

    for warning in ConfigValidator::validate_comprehensive(&config)? {
        let entry = match warning.level {
            ValidationLevel::Info => logger.info(&warning.message),
            ValidationLevel::Warning => logger.warn(&warning.message),
        };
        entry.field("check", "configuration").log();
    }

    if !SystemLookup::system_config_available() {
        logger
            .info("System resolver configuration unavailable, using defaults")
            .log();
    }

    let lookup: Arc<dyn NameLookup> = Arc::new(SystemLookup::new());
    let mut executor = ProbeExecutor::with_lookup(config.clone(), lookup, factory.create_probe_logger())
        .map_err(|e| {
            logger.error("Failed to initialize HTTP client").error_info(&e).log();
            e
        })?;

    let mut emitter = MetricsEmitter::new(io::stdout(), config.key_prefix.as_str());
    executor.run(&mut emitter).await?;

    log_debug!(logger, "Run {} finished, {} metric lines written", factory.run_id(), emitter.lines_written());
    Ok(())
}
