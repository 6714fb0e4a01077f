use anyhow::Context as _;
use anyhow::Result;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::Registry;
use tracing_tree::HierarchicalLayer;
use vecpart::Partition as _;
use vecpart_tools::Narrowing;

const USAGE: &str = "Usage: vec-part [options] -s in.i8bin -d out.";

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optflag("h", "help", "print this help menu");
    options.optopt("s", "src", "input vector file", "FILE");
    options.optopt("d", "dst", "output file prefix", "PREFIX");
    options.optopt("k", "clusters", "number of postings to produce", "COUNT");
    options.optopt(
        "n",
        "narrow",
        "component conversion before clustering: i8 (default) or none",
        "KIND",
    );
    options.optopt("i", "max-iter", "iteration limit for the clustering step", "COUNT");
    options.optopt("r", "seed", "make the clustering step reproducible", "SEED");
    options.optopt("t", "trace", "emit a chrome trace", "FILE");
    options.optflag("v", "verbose", "print diagnostic data");

    let matches = options.parse(env::args().skip(1))?;

    if matches.opt_present("h") {
        eprintln!("{}", options.usage(USAGE));
        eprint!("{}", include_str!("help_after.txt"));
        return Ok(());
    }
    if !matches.free.is_empty() {
        anyhow::bail!("too many arguments\n\n{}", options.usage(USAGE));
    }

    let registry = Registry::default().with(EnvFilter::from_env("LOG")).with(
        HierarchicalLayer::new(4)
            .with_thread_ids(true)
            .with_targets(true)
            .with_bracketed_fields(true),
    );
    let _chrome_trace_guard = match matches.opt_str("t") {
        Some(filename) => {
            let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
                .file(filename)
                .build();
            registry.with(chrome_layer).init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    };

    let src_file: PathBuf = matches
        .opt_str("s")
        .context("missing required option 'src'")?
        .into();
    let dst_prefix: PathBuf = matches
        .opt_str("d")
        .context("missing required option 'dst'")?
        .into();

    let part_count = matches
        .opt_get("k")
        .context("invalid value for option 'clusters'")?
        .unwrap_or(2);
    anyhow::ensure!(part_count >= 1, "expected at least one cluster");

    let narrowing = matches.opt_get("n")?.unwrap_or(Narrowing::SignedByte);

    let mut algorithm = vecpart::KMeans {
        part_count,
        ..vecpart::KMeans::default()
    };
    if let Some(max_iter) = matches
        .opt_get("i")
        .context("invalid value for option 'max-iter'")?
    {
        algorithm.max_iter = max_iter;
    }
    algorithm.seed = matches
        .opt_get("r")
        .context("invalid value for option 'seed'")?;

    let src = vec_io::vector::VectorFile::from_file(&src_file)
        .context("failed to read vector file")?;

    let observations = vecpart_tools::observations(&src.records, src.dimension, narrowing);
    let mut partition = vec![0; src.row_count()];
    let metadata = algorithm
        .partition(&mut partition, observations.view())
        .context("failed to cluster vectors")?;
    if matches.opt_present("v") {
        eprintln!("cluster sizes: {:?}", metadata.part_sizes);
    }

    let summary = vec_io::posting::write_files(&src_file, &dst_prefix, &partition, part_count)
        .context("failed to write posting files")?;
    if matches.opt_present("v") {
        eprintln!("posting counts: {:?}", summary.counts);
    }

    Ok(())
}
