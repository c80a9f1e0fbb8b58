use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::block::Workspace;
use crate::registry::global_serializers;
use crate::render::{global_renderers, workspace_svg};

#[derive(Parser, Debug)]
#[command(
    name = "bbr",
    version,
    about = "Block renderer: lays out a saved block workspace and emits SVG"
)]
pub struct Args {
    /// Workspace JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output SVG file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Renderer to lay out with
    #[arg(short = 'r', long = "renderer", default_value = "geras")]
    pub renderer: String,

    /// List the registered renderers and exit
    #[arg(long = "list-renderers")]
    pub list_renderers: bool,
}

pub fn run() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_renderers {
        let registry = global_renderers().lock().expect("renderer registry poisoned");
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let input = read_input(args.input.as_deref())?;
    let state: serde_json::Value =
        serde_json::from_str(&input).context("input is not valid JSON")?;

    let mut workspace = Workspace::new("cli");
    global_serializers()
        .lock()
        .expect("serializer registry poisoned")
        .load_workspace(&state, &mut workspace)?;

    let renderer = global_renderers()
        .lock()
        .expect("renderer registry poisoned")
        .get(&args.renderer)?;
    log::info!(
        "rendering {} top-level block(s) with {}",
        workspace.top_blocks().len(),
        renderer.name
    );

    let svg = workspace_svg(&workspace, &renderer);
    match args.output.as_deref() {
        Some(path) => std::fs::write(path, svg)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{svg}"),
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
