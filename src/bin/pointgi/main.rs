//! pointgi CLI - evaluate occlusion and indirect diffuse on procedural scenes.

mod scene;

use std::env;
use std::process::ExitCode;
use std::time::Instant;

use pointgi::prelude::*;
use rayon::prelude::*;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use scene::SceneKind;

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "POINTGI_LOG";

struct Options {
    command: String,
    scene: SceneKind,
    samples: usize,
    settings: Settings,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    // Parse global flags
    let mut level = "info";
    let mut rest: Vec<&str> = Vec::new();
    for arg in &args {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => rest.push(arg),
        }
    }
    init_logging(level);

    if rest.is_empty() || matches!(rest[0], "h" | "help" | "-h" | "--help") {
        print_help();
        return ExitCode::SUCCESS;
    }

    let opts = match parse_options(&rest) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("run 'pointgi-cli help' for usage");
            return ExitCode::FAILURE;
        }
    };

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn parse_options(args: &[&str]) -> Result<Options> {
    let mut opts = Options {
        command: args[0].to_string(),
        scene: SceneKind::Corner,
        samples: 16,
        settings: Settings::default(),
    };
    let mut res_override = None;

    let mut it = args[1..].iter();
    while let Some(&arg) = it.next() {
        let mut value = || {
            it.next()
                .copied()
                .ok_or_else(|| Error::other(format!("{arg} needs a value")))
        };
        match arg {
            "--scene" => {
                let name = value()?;
                opts.scene = SceneKind::parse(name).ok_or_else(|| Error::other(format!("unknown scene '{name}'")))?;
            }
            "--samples" => {
                let v = value()?;
                opts.samples = v.parse().map_err(|_| Error::other(format!("bad sample count '{v}'")))?;
            }
            "--settings" => opts.settings = Settings::load(value()?)?,
            "--res" => {
                let v = value()?;
                res_override = Some(v.parse::<f32>().map_err(|_| Error::other(format!("bad resolution '{v}'")))?);
            }
            _ => return Err(Error::other(format!("unknown option '{arg}'"))),
        }
    }

    // Command line wins over the settings file.
    if let Some(res) = res_override {
        opts.settings.set_param("microbufres", res)?;
    }
    opts.settings.validate()?;
    Ok(opts)
}

fn run(opts: &Options) -> Result<()> {
    let start = Instant::now();
    let points = scene::build(opts.scene)?;
    let tree = PointOctree::build(&points);
    tracing::info!(scene = ?opts.scene, surfels = points.len(), elapsed = ?start.elapsed(), "scene ready");

    match opts.command.as_str() {
        "s" | "stats" => cmd_stats(&tree),
        "ao" | "occlusion" => cmd_occlusion(&tree, opts),
        "gi" | "indirect" => cmd_indirect(&tree, opts),
        other => Err(Error::other(format!("unknown command '{other}'"))),
    }
}

fn cmd_stats(tree: &PointOctree) -> Result<()> {
    let stats = tree.stats();
    let root = tree.node(tree.root());
    println!("Surfels:    {}", stats.points);
    println!("Nodes:      {}", stats.nodes);
    println!("Leaves:     {}", stats.leaves);
    println!("Max depth:  {}", stats.max_depth);
    println!("Root bound: {:?} .. {:?}", root.bound.min, root.bound.max);
    println!("Total area: {:.4}", std::f32::consts::PI * root.agg_r * root.agg_r);
    Ok(())
}

fn cmd_occlusion(tree: &PointOctree, opts: &Options) -> Result<()> {
    let queries = scene::query_points(opts.samples);
    let proto = OcclusionShader::new(opts.settings.clone())?;

    let start = Instant::now();
    let values: Vec<f32> = queries
        .par_iter()
        .map_init(|| proto.clone(), |shader, &(p, n)| shader.shade(Some(tree), p, n))
        .collect();
    tracing::debug!(queries = queries.len(), elapsed = ?start.elapsed(), "occlusion done");

    println!("{:>8}  {:>9}", "x", "occlusion");
    for ((p, _), ao) in queries.iter().zip(&values) {
        println!("{:>8.3}  {:>9.4}", p.x, ao);
    }
    Ok(())
}

fn cmd_indirect(tree: &PointOctree, opts: &Options) -> Result<()> {
    let queries = scene::query_points(opts.samples);
    let proto = IndirectShader::new(opts.settings.clone())?;

    let start = Instant::now();
    let values: Vec<Indirect> = queries
        .par_iter()
        .map_init(|| proto.clone(), |shader, &(p, n)| shader.shade(Some(tree), p, n))
        .collect();
    tracing::debug!(queries = queries.len(), elapsed = ?start.elapsed(), "indirect done");

    println!("{:>8}  {:>9}  {:>8} {:>8} {:>8}", "x", "occlusion", "r", "g", "b");
    for ((p, _), ind) in queries.iter().zip(&values) {
        let c = ind.radiosity;
        println!("{:>8.3}  {:>9.4}  {:>8.4} {:>8.4} {:>8.4}", p.x, ind.occlusion, c.x, c.y, c.z);
    }
    Ok(())
}

fn print_help() {
    println!("pointgi-cli - point-based occlusion and indirect diffuse");
    println!();
    println!("USAGE:");
    println!("    pointgi-cli [OPTIONS] <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    ao, occlusion     Ambient occlusion along a line of floor points");
    println!("    gi, indirect      Indirect diffuse and occlusion along the same line");
    println!("    s, stats          Surfel hierarchy statistics");
    println!("    h, help           Show this help");
    println!();
    println!("OPTIONS:");
    println!("    --scene <name>       plane | corner (default corner)");
    println!("    --samples <n>        Number of query points (default 16)");
    println!("    --settings <file>    Query settings as JSON");
    println!("    --res <n>            Micro-buffer face resolution");
    println!("    -v, --verbose        Show debug output");
    println!("    -vv, --trace         Show trace output (very verbose)");
    println!("    -q, --quiet          Errors only");
    println!();
    println!("The {LOG_ENV} environment variable overrides the log filter.");
    println!();
    println!("EXAMPLES:");
    println!("    pointgi-cli ao --scene corner --samples 32");
    println!("    pointgi-cli gi --res 16");
    println!("    pointgi-cli -v stats --scene plane");
}
