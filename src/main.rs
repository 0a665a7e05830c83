use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Context;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info, warn};

use topic_kmeans::{
    ClusteringReport,
    config::{Config, ConfigError},
    load_path, observability,
};

fn main() -> anyhow::Result<()> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(ConfigError::Args(e)) => e.exit(),
        Err(e) => return Err(e).context("failed to load configuration"),
    };

    observability::init(config.log_format, config.log_level)
        .context("failed to initialize tracing")?;

    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info.location().map(ToString::to_string);
        error!(location = ?location, "panic occurred: {panic_info}");
    }));

    let mut corpus = load_path(&config.corpus)
        .with_context(|| format!("failed to load corpus {}", config.corpus.display()))?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let kmeans = config.kmeans();
    info!(
        k = kmeans.k(),
        geometry = ?kmeans.geometry(),
        max_iterations = kmeans.max_iterations(),
        seed = ?config.seed,
        "starting clustering"
    );
    let clustering = kmeans
        .fit(&mut corpus, &mut rng)
        .context("clustering failed")?;
    if !clustering.is_converged() {
        warn!(
            iterations = clustering.convergence().iterations(),
            "reporting clusters from an unconverged run"
        );
    }

    let report = ClusteringReport::build(&clustering);
    match &config.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create report file {}", path.display()))?;
            let mut out = BufWriter::new(file);
            report
                .write_to(config.report_format, &mut out)
                .and_then(|()| out.flush())
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            report
                .write_to(config.report_format, &mut out)
                .context("failed to write report to stdout")?;
        }
    }

    Ok(())
}
