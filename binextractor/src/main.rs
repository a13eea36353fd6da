// SPDX-License-Identifier: MIT
use anyhow::{Context, Result};
use binextractor_core::DumpError;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};

use binextractor::{app, CliArguments};

fn main() -> Result<()> {
    let cli_args = CliArguments::parse();

    // Logs go to stderr to keep the dump on stdout untouched.
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{l}] {m} - {f} +{L}{n}")))
        .build();

    let log_config = log4rs::Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Trace))
        .context("Configuring logging failed.")?;

    log4rs::init_config(log_config).context("Initializing logger failed.")?;

    // Only errors until the structure description sets the threshold
    log::set_max_level(LevelFilter::Error);

    if let Err(e) = app(cli_args) {
        match e.downcast_ref::<DumpError>() {
            Some(err @ DumpError::ConfigMissing(_)) => eprintln!("{err}"),
            _ => log::error!("{e:#}"),
        }
        ::std::process::exit(1);
    }

    Ok(())
}
