use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quadeval_core::consts::*;
use quadeval_core::metrics::MetricKind;
use quadeval_core::report::evaluate::{ErrorPolicy, Evaluator, EvaluatorConfig};
use quadeval_core::report::loader::{filter_by_runlist, read_report, read_runlist};
use quadeval_core::report::stats::banner;

#[derive(Parser)]
#[command(name = "quadeval")]
#[command(about = "Document boundary quality metrics over a JSON report")]
struct Args {
    #[arg(help = "Path to the JSON report")]
    report: PathBuf,

    #[arg(long, help = "File with the image names to evaluate, one per line")]
    runlist: Option<PathBuf>,

    #[arg(
        long,
        value_enum,
        num_args = 1..,
        help = "Metrics to calculate [default: iou_gt minD]"
    )]
    metrics: Vec<MetricKind>,

    #[arg(
        long = "hardChangeThreshold",
        default_value_t = DEFAULT_IOU_THRESHOLD,
        help = "IoU score above which a result is correct"
    )]
    hard_change_threshold: f64,

    #[arg(
        long = "hardChangeResidualsThreshold",
        default_value_t = DEFAULT_RESIDUALS_THRESHOLD,
        help = "minD score below which a result is correct"
    )]
    hard_change_residuals_threshold: f64,

    #[arg(long, value_enum, default_value_t = ErrorPolicy::Halt, help = "What to do when a record fails")]
    on_error: ErrorPolicy,

    #[arg(long, help = "Print the statistics as JSON")]
    json: bool,

    #[arg(long, help = "Number of worker threads (default: all cores)")]
    threads: Option<usize>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let metrics = if args.metrics.is_empty() {
        DEFAULT_METRICS.to_vec()
    } else {
        args.metrics
    };

    let evaluator = Evaluator::new(EvaluatorConfig {
        metrics,
        iou_threshold: args.hard_change_threshold,
        residuals_threshold: args.hard_change_residuals_threshold,
        on_error: args.on_error,
    });

    let mut records = read_report(&args.report)?;
    if let Some(path) = &args.runlist {
        let runlist = read_runlist(path)?;
        records = filter_by_runlist(records, &runlist);
        info!("Evaluating {} records listed in {}", records.len(), path.display());
    }

    let statistics = evaluator.run(&records)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&statistics)?);
    } else {
        print!(
            "{}",
            banner(&evaluator.config().metrics, args.runlist.as_deref())
        );
        print!("{statistics}");
    }

    Ok(())
}
