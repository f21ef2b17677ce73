//! The binary entry point for the Selene viewer.

use clap::Parser;
use selene_app::AppError;
use selene_app::platform::PlatformDirs;
use selene_app::{headless, texture_source, window};
use selene_config::{CliArgs, Config};
use tracing::{error, info};

fn main() {
    let args = CliArgs::parse();
    if let Err(e) = run(&args) {
        if tracing::dispatcher::has_been_set() {
            error!("{e}");
        } else {
            eprintln!("selene: {e}");
        }
        std::process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), AppError> {
    let dirs = PlatformDirs::resolve_and_create(args.config.as_deref())?;
    let mut config = Config::load_or_create(&dirs.config_dir)?;
    config.apply_cli_overrides(args);

    selene_log::init_logging(
        Some(&dirs.log_dir),
        cfg!(debug_assertions),
        Some(&config),
    )?;
    info!("Config directory: {}", dirs.config_dir.display());

    let image = texture_source::texture_or_default(config.texture.path.as_deref())?;

    if args.headless {
        headless::run_headless(&config, image, args.frames)?;
        Ok(())
    } else {
        let source = window::ConfigSource {
            dir: dirs.config_dir.clone(),
            overrides: args.clone(),
        };
        window::run(config, Some(source), image, args.frames)
    }
}
