// SPDX-License-Identifier: MPL-2.0

use dic::{Buffer, Config, DefMap, Image, Interpolation, Runtime, Subset};

use anyhow::Context;
use std::path::{Path, PathBuf};

// Default values for some of the program arguments.
const DEFAULT_OUT_DIR: &str = "out";
const DEFAULT_SIZE: &str = "21,21";
const DEFAULT_INTERPOLATION: &str = "bilinear";
const DEFAULT_STEP: &str = "20";
const DEFAULT_COUNT: &str = "1";
const DEFAULT_THREADS: &str = "0";

/// Entry point of the program.
fn main() -> anyhow::Result<()> {
    // CLI arguments describing the subsets.
    let subset_args = vec![
        clap::Arg::with_name("centroid")
            .long("centroid")
            .number_of_values(2)
            .value_names(&["cx", "cy"])
            .use_delimiter(true)
            .required(true)
            .help("Center of the (middle) point of interest"),
        clap::Arg::with_name("size")
            .long("size")
            .number_of_values(2)
            .value_names(&["width", "height"])
            .use_delimiter(true)
            .default_value(DEFAULT_SIZE)
            .help("Size of the rectangular subsets"),
        clap::Arg::with_name("step")
            .long("step")
            .value_name("N")
            .default_value(DEFAULT_STEP)
            .help("Distance in pixels between points of interest"),
        clap::Arg::with_name("count")
            .long("count")
            .value_name("N")
            .default_value(DEFAULT_COUNT)
            .help("Number of points of interest along each axis"),
    ];
    // CLI arguments describing the deformation map.
    let map_args = vec![
        clap::Arg::with_name("u")
            .long("u")
            .value_name("x")
            .default_value("0")
            .allow_hyphen_values(true)
            .help("Horizontal displacement"),
        clap::Arg::with_name("v")
            .long("v")
            .value_name("x")
            .default_value("0")
            .allow_hyphen_values(true)
            .help("Vertical displacement"),
        clap::Arg::with_name("theta")
            .long("theta")
            .value_name("rad")
            .default_value("0")
            .allow_hyphen_values(true)
            .help("Rotation about each subset centroid"),
        clap::Arg::with_name("interpolation")
            .long("interpolation")
            .value_name("kind")
            .possible_values(&["nearest", "bilinear", "cubic"])
            .default_value(DEFAULT_INTERPOLATION)
            .help("Interpolation used to sample the deformed image"),
    ];
    // CLI arguments related to input, output and the rest.
    let input_output_args = vec![
        clap::Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .help("Multiple levels of verbosity (up to -vvvv)"),
        clap::Arg::with_name("threads")
            .long("threads")
            .value_name("N")
            .default_value(DEFAULT_THREADS)
            .help("Number of worker threads (0 for one per core)"),
        clap::Arg::with_name("out-dir")
            .long("out-dir")
            .default_value(DEFAULT_OUT_DIR)
            .value_name("path")
            .help("Output directory to save subsets images"),
        clap::Arg::with_name("save-subsets")
            .long("save-subsets")
            .help("Save the reference and deformed intensities of every subset"),
        clap::Arg::with_name("REFERENCE")
            .required(true)
            .help("Path to the reference image"),
        clap::Arg::with_name("DEFORMED")
            .required(true)
            .help("Path to the deformed image"),
    ];
    // Read all CLI arguments.
    let matches = clap::App::new("dic")
        .version(std::env!("CARGO_PKG_VERSION"))
        .about("Sample subsets of a reference and a deformed image and report their correlation")
        .args(&subset_args)
        .args(&map_args)
        .args(&input_output_args)
        .get_matches();
    let args = get_args(&matches)?;
    // Set log verbosity.
    stderrlog::new()
        .quiet(false)
        .verbosity(args.config.verbosity as usize)
        .show_level(false)
        .color(stderrlog::ColorChoice::Never)
        .init()
        .context("Failed to initialize log verbosity")?;
    // Start program.
    run(args)
}

#[derive(Debug)]
/// Type holding command line arguments.
struct Args {
    config: Config,
    centroid: (i32, i32),
    size: (usize, usize),
    map: DefMap,
    out_dir: PathBuf,
    save_subsets: bool,
    reference: PathBuf,
    deformed: PathBuf,
}

/// Retrieve the program arguments from clap matches.
fn get_args(matches: &clap::ArgMatches) -> anyhow::Result<Args> {
    let config = Config {
        interpolation: parse_value::<Interpolation>(matches, "interpolation")?,
        threads: parse_value(matches, "threads")?,
        step: parse_value(matches, "step")?,
        count: parse_value(matches, "count")?,
        verbosity: matches.occurrences_of("verbose") as u32,
    };
    if config.count == 0 {
        anyhow::bail!("--count must be at least 1");
    }
    let centroid: Vec<i32> = parse_values(matches, "centroid")?;
    let size: Vec<usize> = parse_values(matches, "size")?;
    let map = DefMap {
        u: parse_value(matches, "u")?,
        v: parse_value(matches, "v")?,
        theta: parse_value(matches, "theta")?,
        ..DefMap::default()
    };
    Ok(Args {
        config,
        centroid: (centroid[0], centroid[1]),
        size: (size[0], size[1]),
        map,
        out_dir: PathBuf::from(matches.value_of("out-dir").unwrap_or(DEFAULT_OUT_DIR)),
        save_subsets: matches.is_present("save-subsets"),
        reference: PathBuf::from(matches.value_of("REFERENCE").unwrap_or_default()),
        deformed: PathBuf::from(matches.value_of("DEFORMED").unwrap_or_default()),
    })
}

/// Parse a single valued argument.
fn parse_value<T>(matches: &clap::ArgMatches, name: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = matches
        .value_of(name)
        .with_context(|| format!("Missing argument --{}", name))?;
    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid value {:?} for --{}: {}", raw, name, e))
}

/// Parse a comma separated argument.
fn parse_values<T>(matches: &clap::ArgMatches, name: &str) -> anyhow::Result<Vec<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = matches
        .values_of(name)
        .with_context(|| format!("Missing argument --{}", name))?;
    raw.map(|s| {
        s.parse()
            .map_err(|e| anyhow::anyhow!("Invalid value {:?} for --{}: {}", s, name, e))
    })
    .collect()
}

/// Start actual program with command line arguments successfully parsed.
fn run(args: Args) -> anyhow::Result<()> {
    // Load both images in memory.
    let now = std::time::Instant::now();
    let reference = Image::load(&args.reference).context("Failed to load reference image")?;
    let deformed = Image::load(&args.deformed).context("Failed to load deformed image")?;
    log::info!("Loading images took {:.1} s", now.elapsed().as_secs_f32());
    if (reference.width(), reference.height()) != (deformed.width(), deformed.height()) {
        log::warn!(
            "Images have different sizes: {}x{} and {}x{}",
            reference.width(),
            reference.height(),
            deformed.width(),
            deformed.height()
        );
    }

    // One subset per point of interest.
    let (width, height) = args.size;
    let (cx, cy) = args.centroid;
    let mut subsets = args
        .config
        .grid(cx, cy)
        .into_iter()
        .map(|(x, y)| {
            Subset::rectangle(x, y, width, height)
                .map(|s| s.with_interpolation(args.config.interpolation))
        })
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to build subsets")?;
    log::info!(
        "{} subsets of {}x{} pixels, {} interpolation",
        subsets.len(),
        width,
        height,
        args.config.interpolation
    );

    // Sample both images in parallel.
    let runtime = Runtime::new(args.config.threads).context("Failed to start the runtime")?;
    let pb = indicatif::ProgressBar::new(2 * subsets.len() as u64);
    let tick = || pb.inc(1);
    let ref_results = runtime.initialize_reference_with(&mut subsets, &reference, tick);
    let maps = vec![args.map; subsets.len()];
    let def_results = runtime.initialize_deformed_with(&mut subsets, &deformed, &maps, tick)?;
    pb.finish_and_clear();

    // Write the correlation of each subset to stdout.
    for ((subset, ref_res), def_res) in subsets.iter().zip(&ref_results).zip(&def_results) {
        let gamma = match (ref_res, def_res) {
            (Ok(()), Ok(())) => match subset.gamma() {
                Ok(gamma) => format!("{}", gamma),
                Err(err) => {
                    log::warn!("{}", err);
                    "nan".to_string()
                }
            },
            _ => "nan".to_string(),
        };
        println!("{}, {}, {}", subset.centroid_x(), subset.centroid_y(), gamma);
    }

    // All that follows is just to help debugging.
    if args.save_subsets {
        log::info!("Saving subsets to {}", args.out_dir.display());
        std::fs::create_dir_all(&args.out_dir)
            .with_context(|| format!("Could not create output dir {:?}", &args.out_dir))?;
        for subset in subsets.iter() {
            save_subset(&args.out_dir, subset)?;
        }
    }
    Ok(())
}

/// Save the initialized buffers of a subset as PNG images.
fn save_subset(out_dir: &Path, subset: &Subset) -> anyhow::Result<()> {
    for &(buffer, use_deformed) in &[(Buffer::Reference, false), (Buffer::Deformed, true)] {
        if !subset.is_initialized(buffer) {
            continue;
        }
        let name = format!(
            "subset_{}_{}_{}.png",
            subset.centroid_x(),
            subset.centroid_y(),
            buffer
        );
        subset
            .write(out_dir.join(&name), use_deformed)
            .with_context(|| format!("Failed to save {}", name))?;
    }
    Ok(())
}
