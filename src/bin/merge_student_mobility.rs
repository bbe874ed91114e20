// src/bin/merge_student_mobility.rs
//! Inbound + outbound mobility rates, kept only where both exist.

use anyhow::Result;
use mobility_merge::{config, pipeline};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::presets::student_mobility(&config::data_dir());
    let summary = pipeline::run(&cfg)?;
    println!("{}", summary);
    Ok(())
}
