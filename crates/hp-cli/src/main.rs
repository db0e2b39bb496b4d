//! hoverplot: classify matplotlib SVG output from the command line.
//!
//! `annotate` writes the SVG back with plot-element classes and
//! `data-group` attributes; `hover` replays a pointer position and prints
//! what the page would show.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use hp_core::PlotData;
use hp_engine::{HoverState, InteractiveChart};

/// hoverplot CLI.
#[derive(Parser)]
#[command(name = "hoverplot")]
#[command(about = "Interactive hover highlighting for matplotlib SVG charts")]
#[command(version)]
struct Cli {
    /// Plot-data JSON (tooltip labels, groups, shifts, per-axes settings)
    #[arg(short, long, global = true)]
    metadata: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify plot elements and write the annotated markup
    Annotate {
        /// SVG or HTML fragment to read
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print per-axes element counts as JSON to stderr
        #[arg(long)]
        report: bool,
    },

    /// Move the pointer to a document position and print the result
    Hover {
        /// SVG or HTML fragment to read
        input: PathBuf,

        /// Pointer x in document units
        x: f64,

        /// Pointer y in document units
        y: f64,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("hoverplot: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let data = load_plot_data(cli.metadata.as_deref())?;
    match cli.command {
        Commands::Annotate {
            input,
            output,
            report,
        } => {
            let chart = open_chart(&input, &data)?;
            if report {
                eprintln!("{:#}", axes_report(&chart));
            }
            let markup = chart.to_markup();
            match output {
                Some(path) => fs::write(&path, markup)
                    .map_err(|e| format!("Cannot write {}: {e}", path.display()))?,
                None => print!("{markup}"),
            }
        }
        Commands::Hover { input, x, y } => {
            let mut chart = open_chart(&input, &data)?;
            chart.pointer_move(x, y);
            println!("{:#}", hover_report(&chart));
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Cannot read {}: {e}", path.display()))
}

fn load_plot_data(path: Option<&Path>) -> Result<PlotData, String> {
    match path {
        Some(path) => PlotData::from_json(&read(path)?),
        None => Ok(PlotData::default()),
    }
}

fn open_chart(input: &Path, data: &PlotData) -> Result<InteractiveChart, String> {
    let chart = InteractiveChart::from_markup(&read(input)?, data)?;
    log::info!(
        "{}: {} axes, {} bindings",
        input.display(),
        chart.registries().len(),
        chart.bindings().len()
    );
    Ok(chart)
}

// ─── Reports ─────────────────────────────────────────────────────────────

fn axes_report(chart: &InteractiveChart) -> Value {
    let axes: Vec<Value> = chart
        .registries()
        .iter()
        .map(|reg| {
            json!({
                "axes": reg.axes_id,
                "found": reg.container.is_some(),
                "lines": reg.lines.size(),
                "bars": reg.bars.size(),
                "points": reg.points.size(),
                "areas": reg.areas.size(),
                "legend": reg.legend.size(),
                "elements": reg.elements.size(),
            })
        })
        .collect();
    json!({ "axes": axes, "bindings": chart.bindings().len() })
}

fn hover_report(chart: &InteractiveChart) -> Value {
    let doc = chart.document();
    let hovered: Vec<Value> = chart
        .element_states()
        .into_iter()
        .filter(|e| e.state == HoverState::Hovered)
        .map(|e| {
            json!({
                "axes": e.axes_id,
                "index": e.index,
                "id": doc.attr(e.node, "id"),
                "category": e.category.class_name(),
            })
        })
        .collect();
    let tooltip = chart.tooltip_state().map_or(Value::Null, |tip| {
        json!({
            "visible": tip.is_visible(),
            "left": tip.left,
            "top": tip.top,
            "content": tip.content,
        })
    });
    json!({ "hovered": hovered, "tooltip": tooltip })
}
