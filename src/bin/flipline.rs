use std::{
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "flipline", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario and print the transforms written on each frame as JSON.
    Replay(ReplayArgs),
    /// Validate a scenario file without replaying it.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Input scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Override the number of frames to render.
    #[arg(long)]
    frames: Option<u64>,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,

    /// Include frames that wrote no transforms.
    #[arg(long)]
    all_frames: bool,

    /// Write the report here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Replay(args) => cmd_replay(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn read_scenario_json(path: &Path) -> anyhow::Result<flipline::Scenario> {
    let f = File::open(path).with_context(|| format!("open scenario '{}'", path.display()))?;
    let r = BufReader::new(f);
    let scenario: flipline::Scenario =
        serde_json::from_reader(r).with_context(|| "parse scenario JSON")?;
    Ok(scenario)
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let scenario = read_scenario_json(&args.in_path)?;
    let mut report = flipline::replay(&scenario, args.frames)?;
    if !args.all_frames {
        report.frames.retain(|f| !f.updates.is_empty());
    }
    for fault in &report.faults {
        eprintln!("fault: {fault}");
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(out, json.as_bytes())
                .with_context(|| format!("write report '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let scenario = read_scenario_json(&args.in_path)?;
    scenario.validate()?;
    eprintln!(
        "ok: {} nodes, {} steps, {} frames at {} fps",
        scenario.nodes.len(),
        scenario.steps.len(),
        scenario.frames,
        scenario.fps
    );
    Ok(())
}
