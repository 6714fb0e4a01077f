use anyhow::Context as _;
use anyhow::Result;
use itertools::Itertools as _;
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use vec_io::posting;
use vec_io::vector;

const USAGE: &str = "Usage: posting-info [options] -p out.";

/// Header fields of a posting file, cross-checked against its actual size.
fn read_info(path: &Path) -> Result<(usize, usize)> {
    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let size = file
        .metadata()
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();
    let (record_count, dimension) = vector::read_header(io::BufReader::new(file))
        .with_context(|| format!("failed to read {}", path.display()))?;

    let expected = (8 + record_count * vector::record_len(dimension)) as u64;
    anyhow::ensure!(
        size == expected,
        "{}: expected {} bytes for {} records of dimension {}, got {}",
        path.display(),
        expected,
        record_count,
        dimension,
        size,
    );
    Ok((record_count, dimension))
}

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optflag("h", "help", "print this help menu");
    options.optopt("n", "parts", "number of postings", "COUNT");
    options.optopt("p", "prefix", "prefix of the posting files", "PREFIX");

    let matches = options.parse(env::args().skip(1))?;

    if matches.opt_present("h") {
        eprintln!("{}", options.usage(USAGE));
        return Ok(());
    }
    if !matches.free.is_empty() {
        anyhow::bail!("too many arguments\n\n{}", options.usage(USAGE));
    }

    let prefix: std::path::PathBuf = matches
        .opt_str("p")
        .context("missing required option 'prefix'")?
        .into();

    let part_count = match matches
        .opt_get("n")
        .context("invalid value for option 'parts'")?
    {
        Some(n) => n,
        // The combined file sits right after the last posting, so the
        // highest contiguous suffix is the part count.
        None => {
            let found = (0_usize..)
                .take_while(|i| posting::path_for(&prefix, *i).is_file())
                .count();
            anyhow::ensure!(
                found >= 2,
                "found {} file(s) at prefix {}, expected postings and a combined file",
                found,
                prefix.display(),
            );
            found - 1
        }
    };
    anyhow::ensure!(part_count >= 1, "expected at least one posting");

    let infos = (0..=part_count)
        .map(|part| read_info(&posting::path_for(&prefix, part)))
        .collect::<Result<Vec<_>>>()?;
    let (&(combined_count, dimension), postings) = infos.split_last().unwrap();

    anyhow::ensure!(
        infos.iter().map(|(_, dimension)| dimension).all_equal(),
        "posting files disagree on the dimension",
    );
    let total: usize = postings.iter().map(|(record_count, _)| record_count).sum();
    anyhow::ensure!(
        total == combined_count,
        "postings hold {total} records but the combined file declares {combined_count}",
    );

    for (part, (record_count, _)) in postings.iter().enumerate() {
        println!("posting {part}: {record_count} records");
    }
    println!("combined: {combined_count} records of dimension {dimension}");

    if total != 0 {
        let ideal = total as f64 / part_count as f64;
        let imbalance = postings
            .iter()
            .map(|(record_count, _)| (*record_count as f64 - ideal) / ideal)
            .minmax()
            .into_option()
            .unwrap()
            .1;
        println!("imbalance: {imbalance}");
    }

    Ok(())
}
