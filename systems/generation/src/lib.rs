#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Generation controller that sequences grammar expansion and turtle
//! interpretation, owns the regeneration lifecycle, and is the only writer of
//! the scene.
//!
//! A run moves through [`Phase::ExpandingGrammar`] and
//! [`Phase::InterpretingSymbols`] before reaching [`Phase::Complete`]. Instant
//! runs finish inside the command that started them. Stepwise runs are an
//! explicit resumable state machine: each [`Command::Tick`] performs exactly
//! one rewrite pass or interprets exactly one symbol. Any trigger that starts
//! a new run first cancels the in-flight one and removes everything it
//! emitted.

use std::time::Duration;

use arbor_core::{
    Command, Emission, EmissionHandle, Event, GenerationParameters, GrowthMode, LeafMaterial,
    MaterialId, Scene,
};
use arbor_system_grammar::{expand, select_rule_set, Expansion};
use arbor_system_turtle::{step, InterpretContext, Turtle};
use arbor_system_variance::{RandomVarianceProvider, VarianceTable};
use tracing::{debug, trace};

/// Interval between two parameter-change polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Seed used when the host does not provide one.
pub const DEFAULT_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Configuration parameters required to construct the controller.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    poll_interval: Duration,
    seed: u64,
    leaf_palette_len: usize,
    emit_branches: bool,
    emit_leaves: bool,
}

impl Config {
    /// Creates a configuration seeded with `seed` and default tuning.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            seed,
            leaf_palette_len: 0,
            emit_branches: true,
            emit_leaves: true,
        }
    }

    /// Overrides the parameter-change poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets how many leaf materials random leaf colouring may choose from.
    #[must_use]
    pub const fn with_leaf_palette(mut self, len: usize) -> Self {
        self.leaf_palette_len = len;
        self
    }

    /// Enables or disables emission of branches and leaves.
    #[must_use]
    pub const fn with_emission(mut self, branches: bool, leaves: bool) -> Self {
        self.emit_branches = branches;
        self.emit_leaves = leaves;
        self
    }

    /// Interval between parameter-change polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Seed of the variance provider.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

/// Observable progress of the current run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No run has started, or the last one was cancelled.
    Idle,
    /// Rewrite passes are being applied.
    ExpandingGrammar {
        /// Passes performed so far.
        completed: u32,
        /// Passes requested.
        iterations: u32,
    },
    /// Symbols are being interpreted.
    InterpretingSymbols {
        /// Symbols consumed so far.
        interpreted: usize,
        /// Symbols in the expanded string.
        total: usize,
    },
    /// Every symbol was interpreted.
    Complete,
}

#[derive(Debug)]
enum Stage {
    Expanding(Expansion),
    Interpreting {
        symbols: String,
        cursor: usize,
        interpreted: usize,
        total: usize,
        turtle: Turtle,
    },
}

#[derive(Debug)]
struct Run {
    parameters: GenerationParameters,
    stage: Stage,
    segments: usize,
    leaves: usize,
}

/// Single entry point for (re)generating a tree.
#[derive(Debug)]
pub struct GenerationController<S> {
    config: Config,
    parameters: GenerationParameters,
    buffered: GenerationParameters,
    scene: Option<S>,
    provider: RandomVarianceProvider,
    variance: VarianceTable,
    leaf_material: LeafMaterial,
    emitted: Vec<EmissionHandle>,
    run: Option<Run>,
    expanded: Option<String>,
    completed: bool,
    poll_elapsed: Duration,
}

impl<S: Scene> GenerationController<S> {
    /// Creates an idle controller. No tree exists until the first regeneration.
    ///
    /// Without a scene, runs still expand and interpret but emit nothing.
    #[must_use]
    pub fn new(config: Config, parameters: GenerationParameters, scene: Option<S>) -> Self {
        Self {
            provider: RandomVarianceProvider::new(config.seed),
            config,
            parameters,
            buffered: parameters,
            scene,
            variance: VarianceTable::ZERO,
            leaf_material: None,
            emitted: Vec::new(),
            run: None,
            expanded: None,
            completed: false,
            poll_elapsed: Duration::ZERO,
        }
    }

    /// Executes a command, appending the resulting events to `out_events`.
    pub fn apply(&mut self, command: Command, out_events: &mut Vec<Event>) {
        match command {
            Command::RegenerateTree => self.regenerate_tree(out_events),
            Command::ToggleGrowthObserved => self.toggle_growth_observed(out_events),
            Command::ToggleRandomMode => self.toggle_random_mode(out_events),
            Command::UpdateParameters { parameters } => self.parameters = parameters,
            Command::Tick { dt } => self.tick(dt, out_events),
        }
    }

    /// Cancels any in-flight run, clears the scene and starts a new run from
    /// the live parameters, which also become the buffered snapshot.
    pub fn regenerate_tree(&mut self, out_events: &mut Vec<Event>) {
        self.buffered = self.parameters;
        let _ = self.stop_run(out_events);
        self.cleanup();
        self.begin(out_events);
    }

    /// Flips between instant and stepwise generation and regenerates.
    pub fn toggle_growth_observed(&mut self, out_events: &mut Vec<Event>) {
        self.parameters.growth_observed = !self.parameters.growth_observed;
        self.regenerate_tree(out_events);
    }

    /// Flips random mode, redraws the variance table and regenerates.
    ///
    /// Leaving random mode resets the variance magnitude to zero.
    pub fn toggle_random_mode(&mut self, out_events: &mut Vec<Event>) {
        self.parameters.random_mode = !self.parameters.random_mode;
        if !self.parameters.random_mode {
            self.parameters.angle_variance = 0;
        }
        self.variance = self.provider.redraw();
        self.regenerate_tree(out_events);
    }

    /// Stops the in-flight stepwise run, if any, and removes everything it
    /// emitted from the scene. Calling it again is a no-op.
    pub fn cancel(&mut self, out_events: &mut Vec<Event>) {
        if self.stop_run(out_events) {
            self.discard_emissions();
        }
    }

    /// Advances the host scheduler by `dt`.
    ///
    /// The change-detection poll runs first; any stepwise run then performs
    /// one unit of work.
    pub fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.poll_elapsed = self.poll_elapsed.saturating_add(dt);
        if self.poll_elapsed >= self.config.poll_interval {
            self.poll_elapsed = Duration::ZERO;
            if self.parameters.differs_from(&self.buffered) {
                out_events.push(Event::ParametersChanged);
                self.regenerate_tree(out_events);
            }
        }

        if self.run.is_some() {
            self.advance(out_events);
        }
    }

    /// Live parameters, including edits not yet picked up by the poll.
    #[must_use]
    pub const fn parameters(&self) -> &GenerationParameters {
        &self.parameters
    }

    /// Parameters captured by the last poll or toggle.
    #[must_use]
    pub const fn buffered_parameters(&self) -> &GenerationParameters {
        &self.buffered
    }

    /// Current progress.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match &self.run {
            Some(Run {
                stage: Stage::Expanding(expansion),
                ..
            }) => Phase::ExpandingGrammar {
                completed: expansion.completed(),
                iterations: expansion.iterations(),
            },
            Some(Run {
                stage:
                    Stage::Interpreting {
                        interpreted, total, ..
                    },
                ..
            }) => Phase::InterpretingSymbols {
                interpreted: *interpreted,
                total: *total,
            },
            None if self.completed => Phase::Complete,
            None => Phase::Idle,
        }
    }

    /// Reports whether a stepwise run is waiting for ticks.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Fully expanded symbol string of the latest run, once expansion finished.
    #[must_use]
    pub fn expanded(&self) -> Option<&str> {
        match &self.run {
            Some(Run {
                stage: Stage::Interpreting { symbols, .. },
                ..
            }) => Some(symbols),
            Some(_) => None,
            None => self.expanded.as_deref(),
        }
    }

    /// Handles of every emission produced since the last cleanup.
    #[must_use]
    pub fn emitted(&self) -> &[EmissionHandle] {
        &self.emitted
    }

    /// Variance table used by the current run.
    #[must_use]
    pub const fn variance(&self) -> &VarianceTable {
        &self.variance
    }

    /// Leaf material drawn for the current run.
    #[must_use]
    pub const fn leaf_material(&self) -> LeafMaterial {
        self.leaf_material
    }

    /// Scene receiving emissions, if attached.
    #[must_use]
    pub fn scene(&self) -> Option<&S> {
        self.scene.as_ref()
    }

    /// Consumes the controller, returning its scene.
    #[must_use]
    pub fn into_scene(self) -> Option<S> {
        self.scene
    }

    fn stop_run(&mut self, out_events: &mut Vec<Event>) -> bool {
        let Some(run) = self.run.take() else {
            return false;
        };
        let discarded = run.segments + run.leaves;
        debug!(discarded, "cancelled in-flight generation run");
        out_events.push(Event::RunCancelled { discarded });
        true
    }

    fn discard_emissions(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            for handle in self.emitted.drain(..) {
                scene.set_active(handle, false);
            }
            scene.clear_all();
        } else {
            self.emitted.clear();
        }
    }

    fn cleanup(&mut self) {
        self.discard_emissions();
        self.expanded = None;
        self.completed = false;

        if self.parameters.random_leaf_color {
            self.leaf_material = self
                .provider
                .draw_index(self.config.leaf_palette_len)
                .and_then(|index| u32::try_from(index).ok())
                .map(MaterialId::new);
        } else {
            self.leaf_material = None;
        }
        self.variance = self.provider.redraw();
    }

    fn begin(&mut self, out_events: &mut Vec<Event>) {
        let parameters = self.parameters;
        let rule_set = select_rule_set(parameters.rule_set);
        let mode = parameters.growth_mode();

        debug!(
            rule_set = parameters.rule_set.get(),
            iterations = parameters.iterations,
            ?mode,
            "starting tree generation"
        );
        out_events.push(Event::RegenerationStarted {
            rule_set: parameters.rule_set,
            iterations: parameters.iterations,
            mode,
        });

        let expansion = expand(rule_set.axiom(), rule_set, parameters.iterations);
        let stage = if expansion.is_finished() {
            interpreting(expansion.into_current())
        } else {
            Stage::Expanding(expansion)
        };
        self.run = Some(Run {
            parameters,
            stage,
            segments: 0,
            leaves: 0,
        });
        self.finish_if_exhausted(out_events);

        if mode == GrowthMode::Instant {
            while self.run.is_some() {
                self.advance(out_events);
            }
        }
    }

    fn advance(&mut self, out_events: &mut Vec<Event>) {
        let Some(mut run) = self.run.take() else {
            return;
        };

        match run.stage {
            Stage::Expanding(mut expansion) => {
                if let Some(length) = expansion.advance().map(str::len) {
                    trace!(pass = expansion.completed(), length, "grammar pass");
                    out_events.push(Event::GrammarExpanded {
                        pass: expansion.completed(),
                        length,
                    });
                }
                run.stage = if expansion.is_finished() {
                    interpreting(expansion.into_current())
                } else {
                    Stage::Expanding(expansion)
                };
            }
            Stage::Interpreting {
                symbols,
                mut cursor,
                mut interpreted,
                total,
                turtle,
            } => {
                let mut turtle = turtle;
                if let Some(symbol) = symbols[cursor..].chars().next() {
                    let context = InterpretContext::new(&run.parameters, &self.variance)
                        .with_leaf_material(self.leaf_material)
                        .with_emission(self.config.emit_branches, self.config.emit_leaves);
                    let (advanced, emission) = step(turtle, symbol, &context);
                    turtle = advanced;
                    cursor += symbol.len_utf8();
                    interpreted += 1;

                    if let Some(emission) = emission {
                        match emission {
                            Emission::Segment(_) => run.segments += 1,
                            Emission::Leaf(_) => run.leaves += 1,
                        }
                        self.emit(emission, out_events);
                    }
                }
                run.stage = Stage::Interpreting {
                    symbols,
                    cursor,
                    interpreted,
                    total,
                    turtle,
                };
            }
        }

        self.run = Some(run);
        self.finish_if_exhausted(out_events);
    }

    fn emit(&mut self, emission: Emission, out_events: &mut Vec<Event>) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        match emission {
            Emission::Segment(segment) => {
                let handle = scene.create_branch_segment(segment);
                self.emitted.push(EmissionHandle::Segment(handle));
                out_events.push(Event::SegmentEmitted { handle });
            }
            Emission::Leaf(leaf) => {
                let handle = scene.create_leaf(leaf);
                self.emitted.push(EmissionHandle::Leaf(handle));
                out_events.push(Event::LeafEmitted { handle });
            }
        }
    }

    fn finish_if_exhausted(&mut self, out_events: &mut Vec<Event>) {
        let exhausted = matches!(
            &self.run,
            Some(Run {
                stage: Stage::Interpreting { interpreted, total, .. },
                ..
            }) if interpreted >= total
        );
        if !exhausted {
            return;
        }

        if let Some(run) = self.run.take() {
            if let Stage::Interpreting { symbols, .. } = run.stage {
                self.expanded = Some(symbols);
            }
            self.completed = true;
            debug!(
                segments = run.segments,
                leaves = run.leaves,
                "tree generation complete"
            );
            out_events.push(Event::GenerationCompleted {
                segments: run.segments,
                leaves: run.leaves,
            });
        }
    }
}

fn interpreting(symbols: String) -> Stage {
    let total = symbols.chars().count();
    Stage::Interpreting {
        symbols,
        cursor: 0,
        interpreted: 0,
        total,
        turtle: Turtle::new(),
    }
}
