use anyhow::{Context, Result};
use clap::Parser;
use common::{init_logger, App};
use std::path::PathBuf;
use tracing::Level;
use worker::{execute_reduce_task, MrTmpNaming, TaskSpec};

/// Execute one reduce task of a MapReduce job.
#[derive(Parser, Debug)]
pub struct Cli {
    /// Job name, as used in the intermediate file names
    #[arg(short, long)]
    job: String,
    /// Index of this reduce task
    #[arg(short, long)]
    task: usize,
    /// Number of map tasks that wrote partitions for this task
    #[arg(short = 'm', long)]
    n_map: usize,
    /// Where to write the sorted output [default: <intermediate-dir>/mrtmp.<job>-res-<task>]
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Plugin providing the reduce function, e.g. `app_wc`
    #[arg(short, long)]
    app: String,
    #[arg(long, env = "MR_LIB_DIR", default_value = "target/release")]
    lib_dir: PathBuf,
    #[arg(long, env = "MR_TMP_DIR", default_value = ".")]
    intermediate_dir: PathBuf,
    #[arg(long, env = "MR_LOG", default_value_t = Level::INFO)]
    log_level: Level,
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logger(cli.log_level, cli.log_dir.as_deref());

    let app = App::load(&cli.lib_dir, &cli.app)?;
    let naming = MrTmpNaming::new(&cli.intermediate_dir);
    let output = cli
        .output
        .unwrap_or_else(|| naming.merge_path(&cli.job, cli.task));
    let spec = TaskSpec::new(cli.job, cli.task, output, cli.n_map);

    execute_reduce_task(&spec, &naming, &app).with_context(|| {
        format!(
            "reduce task {} of job {} ({})",
            spec.reduce_index, spec.job, app.app_name
        )
    })?;
    println!("{}", spec.output.display());
    Ok(())
}
