#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that grows Arbor trees headlessly or in a viewer window.

mod config;
mod export;
mod share;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use arbor_core::{Command, Event, GenerationParameters, RuleSetId, MAX_ITERATIONS};
use arbor_rendering::{Color, ParameterPanel, Presentation, RenderingBackend, TreeScene};
use arbor_rendering_macroquad::MacroquadBackend;
use arbor_scene::{query, SceneStore};
use arbor_system_generation::GenerationController;
use clap::Parser;
use tracing::{debug, info};

use crate::{config::FileConfig, export::TreeExport};

/// Simulated frame length used by headless stepwise runs.
const HEADLESS_FRAME: Duration = Duration::from_millis(16);

/// Command-line arguments accepted by the `arbor` binary.
#[derive(Debug, Parser)]
#[command(name = "arbor", about = "Grow L-system trees with a 3D turtle")]
struct CliArgs {
    /// TOML file providing parameters and controller tuning.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seed for the variance and leaf-material draws.
    #[arg(long)]
    seed: Option<u64>,

    /// Rule set to expand (1-9; other ids keep the axiom).
    #[arg(long)]
    rule_set: Option<u32>,

    /// Number of grammar rewrite passes.
    #[arg(long, value_parser = clap::value_parser!(u32).range(..=i64::from(MAX_ITERATIONS)))]
    iterations: Option<u32>,

    /// Branching angle in degrees.
    #[arg(long)]
    angle: Option<f32>,

    /// Distance travelled per forward symbol.
    #[arg(long)]
    branch_length: Option<f32>,

    /// Width of branch segments.
    #[arg(long)]
    branch_width: Option<f32>,

    /// Length of leaves.
    #[arg(long)]
    leaf_length: Option<f32>,

    /// Width of leaves at their anchor.
    #[arg(long)]
    leaf_start_width: Option<f32>,

    /// Width of leaves at their tip.
    #[arg(long)]
    leaf_end_width: Option<f32>,

    /// Random perturbation magnitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    angle_variance: Option<i32>,

    /// Perturb rotations with the variance table.
    #[arg(long)]
    random_mode: bool,

    /// Draw a random leaf colour per regeneration.
    #[arg(long)]
    random_leaf_color: bool,

    /// Grow the tree one pass or symbol per frame.
    #[arg(long)]
    growth_observed: bool,

    /// Start from the parameters encoded in a share string.
    #[arg(long, value_name = "STRING")]
    import: Option<String>,

    /// Print a share string for the resolved parameters.
    #[arg(long)]
    share: bool,

    /// Write the generated geometry to a JSON file.
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Open the interactive viewer instead of running headless.
    #[arg(long)]
    view: bool,
}

impl CliArgs {
    /// Applies per-field overrides on top of `parameters`.
    fn apply_overrides(&self, parameters: &mut GenerationParameters) {
        if let Some(rule_set) = self.rule_set {
            parameters.rule_set = RuleSetId::new(rule_set);
        }
        if let Some(iterations) = self.iterations {
            parameters.iterations = iterations;
        }
        if let Some(angle) = self.angle {
            parameters.angle = angle;
        }
        if let Some(branch_length) = self.branch_length {
            parameters.branch_length = branch_length;
        }
        if let Some(branch_width) = self.branch_width {
            parameters.branch_width = branch_width;
        }
        if let Some(leaf_length) = self.leaf_length {
            parameters.leaf_length = leaf_length;
        }
        if let Some(leaf_start_width) = self.leaf_start_width {
            parameters.leaf_start_width = leaf_start_width;
        }
        if let Some(leaf_end_width) = self.leaf_end_width {
            parameters.leaf_end_width = leaf_end_width;
        }
        if let Some(angle_variance) = self.angle_variance {
            parameters.angle_variance = angle_variance;
        }
        parameters.random_mode |= self.random_mode;
        parameters.random_leaf_color |= self.random_leaf_color;
        parameters.growth_observed |= self.growth_observed;
    }
}

/// Entry point for the Arbor command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let file_config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let mut parameters = match &args.import {
        Some(encoded) => share::decode(encoded).context("failed to import share string")?,
        None => file_config.parameters,
    };
    args.apply_overrides(&mut parameters);

    if args.share {
        println!(
            "{}",
            share::encode(&parameters).context("failed to encode share string")?
        );
    }

    let controller = GenerationController::new(
        file_config.controller_config(args.seed),
        parameters,
        Some(SceneStore::new()),
    );
    let scene = TreeScene::new(
        arbor_rendering::DEFAULT_BRANCH_COLOR,
        arbor_rendering::DEFAULT_LEAF_COLOR,
        file_config.palette(),
    );

    if args.view {
        run_viewer(controller, scene)
    } else {
        run_headless(controller, args.export)
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_headless(
    mut controller: GenerationController<SceneStore>,
    export: Option<PathBuf>,
) -> Result<()> {
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);
    while controller.is_running() {
        controller.apply(Command::Tick { dt: HEADLESS_FRAME }, &mut events);
    }
    log_events(&events);

    let parameters = *controller.parameters();
    let symbols = controller
        .expanded()
        .map_or(0, |symbols| symbols.chars().count());
    let store = controller
        .scene()
        .context("headless run lost its scene store")?;

    info!(
        rule_set = parameters.rule_set.get(),
        iterations = parameters.iterations,
        symbols,
        segments = query::active_segment_count(store),
        leaves = query::active_leaf_count(store),
        "tree generated"
    );

    if let Some(path) = export {
        TreeExport::capture(parameters, symbols, store).write_to(&path)?;
        info!(path = %path.display(), "tree exported");
    }

    Ok(())
}

fn run_viewer(mut controller: GenerationController<SceneStore>, scene: TreeScene) -> Result<()> {
    let mut panel = ParameterPanel::new(*controller.parameters());
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);
    log_events(&events);

    let presentation = Presentation::new("Arbor", Color::from_rgb_u8(24, 28, 32), scene);

    MacroquadBackend::new()
        .with_vsync(true)
        .run(presentation, move |dt, input, scene| {
            let mut commands = Vec::new();
            panel.handle(&input, &mut commands);
            commands.push(Command::Tick { dt });

            let mut events = Vec::new();
            for command in commands {
                controller.apply(command, &mut events);
            }
            panel.sync(controller.parameters());
            log_events(&events);

            if let Some(store) = controller.scene() {
                scene.replace_geometry(
                    query::active_segments(store),
                    query::active_leaves(store),
                );
            }
            scene.panel = Some(panel.view());
        })
}

fn log_events(events: &[Event]) {
    for event in events {
        match event {
            Event::ParametersChanged => debug!("parameter change detected"),
            Event::RunCancelled { discarded } => info!(discarded, "generation cancelled"),
            Event::RegenerationStarted {
                rule_set,
                iterations,
                mode,
            } => info!(
                rule_set = rule_set.get(),
                iterations,
                ?mode,
                "regenerating tree"
            ),
            Event::GenerationCompleted { segments, leaves } => {
                info!(segments, leaves, "generation complete");
            }
            Event::GrammarExpanded { .. }
            | Event::SegmentEmitted { .. }
            | Event::LeafEmitted { .. } => {}
        }
    }
}
