use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chronicle::{Episode, FileInfo, FrameIndex, LogReader, PlaybackConfig, Replayer, World};
use clap::Parser;

#[derive(Parser)]
#[command(name = "chronicle-inspect")]
#[command(about = "Summarise a frame log and optionally replay it into a headless world")]
struct Args {
    /// Log file to read
    file: PathBuf,

    #[arg(long, help = "Print the frame index")]
    frames: bool,

    #[arg(long, help = "Replay the log and print the playback report")]
    replay: bool,

    #[arg(long, help = "Leave sensors out of the replay")]
    no_sensors: bool,

    #[arg(long, value_name = "SECONDS", help = "Stop replaying after this much recorded time")]
    until: Option<f64>,
}

fn open_log(path: &Path) -> Result<LogReader<BufReader<File>>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    LogReader::open(BufReader::new(file))
        .with_context(|| format!("{} is not a frame log", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let info = FileInfo::scan(&mut open_log(&args.file)?).context("failed to scan log")?;
    println!("{info}");

    if args.frames {
        let index =
            FrameIndex::build(&mut open_log(&args.file)?).context("failed to index frames")?;
        println!("\nFrame index ({} frames, {:.3} s):", index.len(), index.duration());
        for entry in index.entries() {
            println!(
                "  {:>6}  {:>10.3} s  @ {}",
                entry.frame_id, entry.elapsed, entry.offset
            );
        }
    }

    if args.replay {
        let config = PlaybackConfig {
            replay_sensors: !args.no_sensors,
            time_limit: args.until,
        };
        let mut world = World::new();
        for controller in &info.controllers {
            world.controllers_mut().insert(controller.clone());
        }

        let mut replayer = Replayer::new(config);
        replayer.open(open_log(&args.file)?)?;
        let report = replayer
            .play_to_end(&mut world)
            .context("playback aborted")?;
        println!("\n{report}");
        log::info!("{} actors alive after replay", world.actor_count());
    }

    Ok(())
}
