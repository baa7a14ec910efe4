use anyhow::{Context, Result};
use clap::Parser;
use common::{init_logger, App};
use std::path::PathBuf;
use tracing::{info, Level};

mod job;

use job::Job;

/// Run a MapReduce job in a single process: map every input, run every
/// reduce task, merge their outputs.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(short, long)]
    app_name: String,
    #[arg(short, long, default_value = "seq")]
    job: String,
    #[arg(short, long, default_value_t = 3)]
    n_reduce: usize,
    #[arg(long, env = "MR_LIB_DIR", default_value = "target/release")]
    lib_dir: PathBuf,
    #[arg(short, long, env = "MR_TMP_DIR", default_value = ".")]
    work_dir: PathBuf,
    /// Leave partitions and per-task outputs on disk after the merge
    #[arg(long)]
    keep_intermediates: bool,
    #[arg(long, env = "MR_LOG", default_value_t = Level::INFO)]
    log_level: Level,
    #[arg(required = true)]
    input_files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logger(cli.log_level, None);

    let app = App::load(&cli.lib_dir, &cli.app_name)?;
    let job = Job::new(&cli.job, cli.n_reduce, cli.input_files, &cli.work_dir)?;
    info!(
        job = %job.name,
        n_map = job.n_map(),
        n_reduce = job.n_reduce,
        work_dir = %job.naming().dir().display(),
        "job starting"
    );

    job.map_phase(&app).context("map phase")?;

    let lib_dir = cli.lib_dir.clone();
    let app_name = cli.app_name.clone();
    let reports = job
        .reduce_phase(move || App::load(&lib_dir, &app_name))
        .await
        .context("reduce phase")?;
    let records_in: usize = reports.iter().map(|r| r.records_in).sum();
    let keys: usize = reports.iter().map(|r| r.keys).sum();
    info!(job = %job.name, records_in, keys, "reduce phase complete");

    let output = job.merge().context("merge")?;
    if !cli.keep_intermediates {
        job.cleanup();
    }
    println!("{}", output.display());
    Ok(())
}
