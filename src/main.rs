use clap::Parser;
use dragmenu::config;
use dragmenu::sys::replay::{Replayer, Trace};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dragmenu-replay", version, about, long_about = None)]
struct Cli {
    /// TOML trace with the layout and timed pointer events
    trace: Option<PathBuf>,

    /// Read settings from this file instead of the user config
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Write the bundled default config to the user config dir and exit
    #[arg(long)]
    write_default_config: bool,

    /// Export the final frame as PNG
    #[cfg(feature = "png")]
    #[arg(short = 's', long)]
    snapshot: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.write_default_config {
        let path = config::write_default_config()?;
        println!("{}", path.display());
        return Ok(());
    }

    let Some(trace_path) = cli.trace.as_deref() else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = config::load_or_default(cli.config.as_deref());
    let trace = Trace::load(trace_path)
        .map_err(|e| anyhow::anyhow!("Failed to load trace {}: {}", trace_path.display(), e))?;
    log::info!(
        "Replaying {} events over {} items",
        trace.events.len(),
        trace.items.len()
    );

    #[cfg(feature = "png")]
    let theme = dragmenu::gui::MenuTheme::from_config(&config.theme);

    let report = Replayer::new(config).run(&trace);
    for event in &report.events {
        println!("{}", event);
    }
    match report.selected() {
        Some(index) => println!("selected item {}", index),
        None if report.is_open => println!("menu left open"),
        None => println!("nothing selected"),
    }

    #[cfg(feature = "png")]
    {
        if let Some(path) = cli.snapshot.as_deref() {
            let (width, height) = snapshot_size(&trace);
            dragmenu::gui::png::export_frame(&report.frame, &theme, width, height, path)?;
        }
    }

    Ok(())
}

/// Canvas large enough for every box in the trace.
#[cfg(feature = "png")]
fn snapshot_size(trace: &Trace) -> (i32, i32) {
    let boxes = trace
        .anchor
        .iter()
        .chain(trace.menu.as_ref().map(|m| &m.bounds))
        .chain(&trace.items);
    let (w, h) = boxes.fold((1.0_f32, 1.0_f32), |(w, h), b| {
        (w.max(b.right()), h.max(b.bottom()))
    });
    ((w.ceil() as i32) + 32, (h.ceil() as i32) + 32)
}
