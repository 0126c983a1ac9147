#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Arbor tree generator.
//!
//! This crate defines the message surface that connects adapters, the
//! generation controller, and the scene that stores emitted geometry.
//! Adapters submit [`Command`] values describing desired transitions, the
//! controller executes them through its `apply` entry point, and then reports
//! [`Event`] values describing what happened. Geometry leaves the pipeline
//! exclusively through the [`Scene`] trait.

use std::time::Duration;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing floating-point generation parameters.
pub const PARAMETER_EPSILON: f32 = 0.01;

/// Largest number of rewrite passes a host may request.
///
/// The catalogued rule sets grow up to eightfold per pass, so deeper trees
/// exhaust memory.
pub const MAX_ITERATIONS: u32 = 7;

/// Commands accepted by the generation controller.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards the current tree and generates a new one from the live parameters.
    RegenerateTree,
    /// Flips between instant and stepwise generation, regenerating the tree.
    ToggleGrowthObserved,
    /// Flips random mode, redrawing the variance table and regenerating the tree.
    ToggleRandomMode,
    /// Replaces the live parameters. Changes are picked up by the next poll.
    UpdateParameters {
        /// Parameters supplied by the parameter collaborator.
        parameters: GenerationParameters,
    },
    /// Advances the host scheduler by the provided delta time.
    Tick {
        /// Duration of wall-clock time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events reported by the generation controller after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The change-detection poll observed edited parameters.
    ParametersChanged,
    /// An in-flight stepwise run was stopped before reaching completion.
    RunCancelled {
        /// Number of emissions the cancelled run had produced.
        discarded: usize,
    },
    /// A new run began after cleanup finished.
    RegenerationStarted {
        /// Rule set driving the run.
        rule_set: RuleSetId,
        /// Number of rewrite passes requested.
        iterations: u32,
        /// Pacing selected for the run.
        mode: GrowthMode,
    },
    /// A grammar rewrite pass completed.
    GrammarExpanded {
        /// One-based index of the completed pass.
        pass: u32,
        /// Length of the symbol string produced by the pass.
        length: usize,
    },
    /// A branch segment was handed to the scene.
    SegmentEmitted {
        /// Handle allocated by the scene.
        handle: SegmentHandle,
    },
    /// A leaf marker was handed to the scene.
    LeafEmitted {
        /// Handle allocated by the scene.
        handle: LeafHandle,
    },
    /// The run interpreted every symbol.
    GenerationCompleted {
        /// Number of segments emitted by the run.
        segments: usize,
        /// Number of leaves emitted by the run.
        leaves: usize,
    },
}

/// Pacing used to drive a generation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrowthMode {
    /// Expansion and interpretation complete synchronously.
    Instant,
    /// One expansion pass or one symbol is processed per tick.
    Stepwise,
}

/// Identifier of a catalogued rule set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSetId(u32);

impl RuleSetId {
    /// Lowest identifier present in the catalogue.
    pub const FIRST: Self = Self(1);
    /// Highest identifier present in the catalogue.
    pub const LAST: Self = Self(9);

    /// Creates a new rule set identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl Default for RuleSetId {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Index into the configured leaf palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(u32);

impl MaterialId {
    /// Creates a new material identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Material applied to a leaf. `None` selects the scene's default material.
pub type LeafMaterial = Option<MaterialId>;

/// Every knob that shapes a generated tree.
///
/// The value is snapshot-compared on each poll so edits made by the parameter
/// collaborator trigger a regeneration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParameters {
    /// Rule set selected from the catalogue.
    pub rule_set: RuleSetId,
    /// Number of grammar rewrite passes.
    pub iterations: u32,
    /// Branching angle in degrees applied by `+` and `-`.
    pub angle: f32,
    /// Distance travelled by `F` and `G`.
    pub branch_length: f32,
    /// Width assigned to emitted segments.
    pub branch_width: f32,
    /// Length of emitted leaves.
    pub leaf_length: f32,
    /// Width of a leaf at its anchor.
    pub leaf_start_width: f32,
    /// Width of a leaf at its tip.
    pub leaf_end_width: f32,
    /// Whether rotations are perturbed by the variance table.
    pub random_mode: bool,
    /// Magnitude in degrees of the random perturbation.
    pub angle_variance: i32,
    /// Whether each regeneration draws a random leaf material.
    pub random_leaf_color: bool,
    /// Whether generation is paced across ticks.
    pub growth_observed: bool,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            rule_set: RuleSetId::default(),
            iterations: 5,
            angle: 25.0,
            branch_length: 3.0,
            branch_width: 1.0,
            leaf_length: 1.0,
            leaf_start_width: 3.0,
            leaf_end_width: 2.0,
            random_mode: false,
            angle_variance: 10,
            random_leaf_color: false,
            growth_observed: false,
        }
    }
}

impl GenerationParameters {
    /// Reports whether `other` differs enough to warrant a regeneration.
    ///
    /// Floating-point fields tolerate drift below [`PARAMETER_EPSILON`].
    #[must_use]
    pub fn differs_from(&self, other: &Self) -> bool {
        let drifted = |a: f32, b: f32| (a - b).abs() > PARAMETER_EPSILON;

        self.rule_set != other.rule_set
            || self.iterations != other.iterations
            || drifted(self.angle, other.angle)
            || drifted(self.branch_length, other.branch_length)
            || drifted(self.branch_width, other.branch_width)
            || drifted(self.leaf_length, other.leaf_length)
            || drifted(self.leaf_start_width, other.leaf_start_width)
            || drifted(self.leaf_end_width, other.leaf_end_width)
            || self.growth_observed != other.growth_observed
            || self.random_mode != other.random_mode
            || self.angle_variance != other.angle_variance
            || self.random_leaf_color != other.random_leaf_color
    }

    /// Pacing implied by the `growth_observed` flag.
    #[must_use]
    pub const fn growth_mode(&self) -> GrowthMode {
        if self.growth_observed {
            GrowthMode::Stepwise
        } else {
            GrowthMode::Instant
        }
    }

    /// Random perturbation magnitude in degrees, zero when random mode is off.
    #[must_use]
    pub fn effective_variance(&self) -> f32 {
        if self.random_mode {
            self.angle_variance as f32
        } else {
            0.0
        }
    }
}

/// Position and orientation of the turtle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurtleState {
    /// Location of the turtle in world space.
    pub position: Vec3,
    /// Rotation from the turtle's local frame into world space.
    pub orientation: Quat,
}

impl TurtleState {
    /// State at the origin facing along the identity rotation.
    pub const ORIGIN: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    /// Creates a state from explicit position and orientation.
    #[must_use]
    pub const fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Direction the turtle travels when moving forward.
    #[must_use]
    pub fn heading(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }
}

impl Default for TurtleState {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// Straight branch element between two turtle positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Turtle position before moving.
    pub start: Vec3,
    /// Turtle position after moving.
    pub end: Vec3,
    /// Width of the branch.
    pub width: f32,
}

impl Segment {
    /// Length of the segment in world units.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// Leaf decoration emitted when a branch scope closes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeafMarker {
    /// Tip of the branch the leaf grows from.
    pub anchor: Vec3,
    /// Orientation of that branch tip.
    pub orientation: Quat,
    /// Length of the leaf.
    pub length: f32,
    /// Width at the anchor.
    pub start_width: f32,
    /// Width at the tip.
    pub end_width: f32,
    /// Material applied when drawing the leaf.
    pub material: LeafMaterial,
}

impl LeafMarker {
    /// Far end of the leaf, `length` units along the tip's heading.
    #[must_use]
    pub fn tip(&self) -> Vec3 {
        self.anchor + self.orientation * Vec3::Y * self.length
    }
}

/// Geometry produced by interpreting a single symbol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Emission {
    /// A branch segment.
    Segment(Segment),
    /// A leaf marker.
    Leaf(LeafMarker),
}

/// Scene-allocated handle of a branch segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentHandle(u64);

impl SegmentHandle {
    /// Creates a handle wrapping the provided value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Scene-allocated handle of a leaf marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeafHandle(u64);

impl LeafHandle {
    /// Creates a handle wrapping the provided value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Handle of any emission owned by a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EmissionHandle {
    /// Handle of a branch segment.
    Segment(SegmentHandle),
    /// Handle of a leaf marker.
    Leaf(LeafHandle),
}

/// Engine-side store that owns emitted geometry.
///
/// Only the generation controller mutates a scene. Handles are never reused,
/// so a handle held past `clear_all` refers to nothing.
pub trait Scene {
    /// Stores a branch segment and returns its handle.
    fn create_branch_segment(&mut self, segment: Segment) -> SegmentHandle;

    /// Stores a leaf marker and returns its handle.
    fn create_leaf(&mut self, leaf: LeafMarker) -> LeafHandle;

    /// Shows or hides a previously created emission. Unknown handles are ignored.
    fn set_active(&mut self, handle: EmissionHandle, active: bool);

    /// Releases every emission.
    fn clear_all(&mut self);
}
