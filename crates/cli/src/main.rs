#![deny(unsafe_code)]
//! CLI binary for the plexus background-effect engine.
//!
//! Subcommands:
//! - `render [preset]` — run the field N frames, write a PNG of the last
//! - `replay <recipe>` — re-render a recipe JSON file
//! - `list` — print available presets

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use glam::DVec2;
use plexus_core::{Driver, Effect, Recipe};
use plexus_render::raster::PixelSurface;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "plexus", about = "Connected-particle background effect renderer")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a preset for N frames and write a PNG of the final frame.
    Render {
        /// Preset name (e.g. "drift" or "pulse").
        #[arg(default_value = "drift")]
        preset: String,

        /// Surface width in pixels.
        #[arg(short = 'W', long, default_value_t = 800)]
        width: usize,

        /// Surface height in pixels.
        #[arg(short = 'H', long, default_value_t = 600)]
        height: usize,

        /// Number of frames to simulate.
        #[arg(short, long, default_value_t = 300)]
        frames: u64,

        /// PRNG seed for deterministic output.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Pointer position "x,y" held for the whole run.
        #[arg(long)]
        pointer: Option<String>,

        /// Parameter overrides as a JSON string.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Output file path.
        #[arg(short, long, default_value = "plexus.png")]
        output: PathBuf,
    },
    /// Re-render a recipe JSON file.
    Replay {
        /// Path to the recipe file.
        recipe: PathBuf,

        /// Output file path.
        #[arg(short, long, default_value = "plexus.png")]
        output: PathBuf,
    },
    /// List available presets.
    List,
}

/// Parses a pointer flag of the form "x,y".
fn parse_pointer(raw: &str) -> Result<DVec2, CliError> {
    let invalid = || CliError::Input(format!("invalid --pointer '{raw}': expected \"x,y\""));
    let (x, y) = raw.split_once(',').ok_or_else(invalid)?;
    let x: f64 = x.trim().parse().map_err(|_| invalid())?;
    let y: f64 = y.trim().parse().map_err(|_| invalid())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(invalid());
    }
    Ok(DVec2::new(x, y))
}

/// Builds the field from a recipe, runs it through the driver, and writes
/// the final frame as a PNG.
fn render_recipe(recipe: &Recipe, output: &Path, json: bool) -> Result<(), CliError> {
    recipe.validate().map_err(CliError::from)?;

    let mut field = plexus_render::from_name(
        &recipe.preset,
        recipe.width as f64,
        recipe.height as f64,
        recipe.seed,
        &recipe.params,
    )?;
    field.set_pointer(recipe.pointer.map(|[x, y]| DVec2::new(x, y)));

    let mut surface = PixelSurface::new(recipe.width, recipe.height)?;
    let frames_run = Driver::new().run(&mut field, &mut surface, Some(recipe.frames), |_| {})?;

    plexus_render::snapshot::write_png(&surface, output)?;

    if json {
        let info = serde_json::json!({
            "preset": recipe.preset,
            "width": recipe.width,
            "height": recipe.height,
            "frames": frames_run,
            "seed": recipe.seed,
            "output": output.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        eprintln!(
            "rendered {} ({}x{}, {frames_run} frames, seed {}) -> {}",
            recipe.preset,
            recipe.width,
            recipe.height,
            recipe.seed,
            output.display()
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let presets = plexus_render::list_presets();
            if cli.json {
                let entries: Vec<serde_json::Value> = presets
                    .iter()
                    .map(|name| {
                        let params = plexus_render::preset_params(name)?;
                        Ok(serde_json::json!({
                            "name": name,
                            "particle_count": params.particle_count,
                        }))
                    })
                    .collect::<Result<_, CliError>>()?;
                let info = serde_json::json!({ "presets": entries });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Presets:");
                for name in presets {
                    let params = plexus_render::preset_params(name)?;
                    println!("  {name} ({} particles)", params.particle_count);
                }
            }
            Ok(())
        }
        Command::Render {
            preset,
            width,
            height,
            frames,
            seed,
            pointer,
            params,
            output,
        } => {
            let params: serde_json::Value = serde_json::from_str(&params)
                .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
            let pointer = pointer.as_deref().map(parse_pointer).transpose()?;
            let recipe = Recipe {
                preset,
                width,
                height,
                params,
                seed,
                frames,
                pointer: pointer.map(|p| [p.x, p.y]),
            };
            render_recipe(&recipe, &output, cli.json)
        }
        Command::Replay { recipe, output } => {
            let raw = std::fs::read_to_string(&recipe)
                .map_err(|e| CliError::Io(format!("cannot read {}: {e}", recipe.display())))?;
            let recipe: Recipe = serde_json::from_str(&raw)
                .map_err(|e| CliError::Input(format!("invalid recipe: {e}")))?;
            render_recipe(&recipe, &output, cli.json)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
