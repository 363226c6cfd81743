//! trueno-grammar-ascii - render a YAML plot description as ASCII art.
//!
//! Each facet panel is printed under its label.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use trueno_grammar::canvas::Canvas;
use trueno_grammar::config::PlotConfig;

#[derive(Parser)]
#[command(name = "trueno-grammar-ascii", about = "Render a Grammar of Graphics plot as ASCII art")]
struct Cli {
    /// YAML plot description
    config: PathBuf,

    /// Canvas width in characters
    #[arg(long, default_value_t = 60)]
    width: usize,

    /// Canvas height in lines
    #[arg(long, default_value_t = 20)]
    height: usize,

    /// Fit each panel's viewport to its own primitives instead of the
    /// coordinate system's plane (always on for custom coordinates)
    #[arg(long)]
    fit: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = PlotConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let rendered = config.to_plot()?.render().context("rendering plot")?;

    if let Some(title) = &rendered.title {
        println!("{title}");
    }
    for panel in &rendered.panels {
        let canvas = Canvas::new(cli.width, cli.height)?;
        let mut canvas = match rendered.plane {
            Some(plane) if !cli.fit => canvas.viewport(plane),
            _ => canvas.fit(&panel.primitives),
        };
        canvas.draw_all(&panel.primitives);
        if !panel.label.is_empty() {
            println!("[{}] row {} col {}", panel.label, panel.row, panel.col);
        }
        print!("{}", canvas.render());
    }
    Ok(())
}
