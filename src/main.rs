use anyhow::{Context, Result};
use mobility_merge::{config, pipeline};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mobility_merge=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) load pipelines ───────────────────────────────────────────
    let pipelines = config::configured_pipelines()?;
    info!("{} pipelines to run", pipelines.len());

    // ─── 3) run in order; later pipelines may read earlier outputs ───
    for p in &pipelines {
        let summary =
            pipeline::run(p).with_context(|| format!("pipeline `{}` failed", p.name))?;
        println!("{}", summary);
    }

    info!("all done");
    Ok(())
}
