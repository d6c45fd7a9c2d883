//! # Render Simulator
//!
//! Headless run of the whole pipeline: renders one frame through the engine
//! pool, commits it row by row over the shared storage channel, and prints
//! the run summary.
//!
//! ```bash
//! # Reference 960x544 frame
//! ./render_sim
//!
//! # Custom config, keep the picture
//! ./render_sim zoom.toml --dump zoom.frame
//! ```

use std::path::PathBuf;
use std::process;

use scanbrot::frame_dump::{dump_to_path, FrameHeader};
use scanbrot::stats::print_summary;
use scanbrot::{RenderConfig, RenderLoop};

/// Upper bound on ticks for one frame.
const MAX_TICKS: u64 = 200_000_000;

struct Args {
    config: Option<PathBuf>,
    dump: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        dump: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dump" => {
                let path = iter.next().ok_or("--dump needs a path")?;
                args.dump = Some(PathBuf::from(path));
            }
            "-h" | "--help" => return Err(String::new()),
            _ if args.config.is_none() && !arg.starts_with('-') => args.config = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument: {arg}")),
        }
    }
    Ok(args)
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("✗ {message}");
            }
            eprintln!("usage: render_sim [config.toml] [--dump out.frame]");
            process::exit(2);
        }
    };

    let config = match &args.config {
        Some(path) => match RenderConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("✗ FATAL: {e}");
                process::exit(1);
            }
        },
        None => RenderConfig::default(),
    };

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                       SCANBROT RENDER SIM");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();
    println!("  Frame:    {} x {}", config.geometry.width, config.geometry.height);
    println!("  Engines:  {}", config.engines.count);
    println!("  Row:      {} ticks, {} rows/frame", config.timing.ticks_per_row, config.timing.total_rows);
    println!(
        "  View:     {} {:+}i  scale {}  cap {}",
        config.view.center_re, config.view.center_im, config.view.scale, config.view.max_iters
    );
    println!();

    let mut render = match RenderLoop::new(config) {
        Ok(render) => render,
        Err(e) => {
            eprintln!("✗ FATAL: {e}");
            process::exit(1);
        }
    };

    match render.run_until_idle(MAX_TICKS) {
        Ok(ticks) => println!("✓ Frame committed in {ticks} ticks"),
        Err(e) => {
            eprintln!("✗ {e}");
            print_summary(&render.stats(), render.frame_ticks());
            process::exit(1);
        }
    }
    println!();
    print_summary(&render.stats(), render.frame_ticks());

    if let Some(path) = &args.dump {
        let header = FrameHeader::new(
            config.geometry.width,
            config.geometry.height,
            render.scheduler().generation().0,
        );
        match dump_to_path(path, &header, render.store().as_bytes()) {
            Ok(()) => println!("✓ Frame written to {}", path.display()),
            Err(e) => {
                eprintln!("✗ Dump failed: {e}");
                process::exit(1);
            }
        }
    }

    if render.stats().violations > 0 {
        process::exit(1);
    }
}
