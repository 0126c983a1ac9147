//! Model of the interactive parameter panel.
//!
//! The panel owns a copy of the parameters, clamps edits to the slider
//! ranges and translates frame input into controller commands.

use std::ops::RangeInclusive;

use arbor_core::{Command, GenerationParameters, RuleSetId, MAX_ITERATIONS};
use arbor_system_grammar::select_rule_set;

use crate::{FrameInput, PanelView, SliderEdits};

/// Closed interval accepted by a continuous slider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderRange {
    min: f32,
    max: f32,
}

impl SliderRange {
    /// Creates a range spanning `min..=max`.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Clamps `value` into the range.
    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Rewrite passes selectable from the panel.
pub const ITERATION_RANGE: RangeInclusive<u32> = 1..=MAX_ITERATIONS;
/// Branching angle in degrees.
pub const ANGLE_RANGE: SliderRange = SliderRange::new(0.0, 90.0);
/// Distance travelled per forward symbol.
pub const BRANCH_LENGTH_RANGE: SliderRange = SliderRange::new(0.0, 15.0);
/// Segment width.
pub const BRANCH_WIDTH_RANGE: SliderRange = SliderRange::new(0.0, 3.0);
/// Leaf length.
pub const LEAF_LENGTH_RANGE: SliderRange = SliderRange::new(0.0, 15.0);
/// Leaf start and end widths.
pub const LEAF_WIDTH_RANGE: SliderRange = SliderRange::new(0.0, 10.0);
/// Random variance magnitude in degrees.
pub const ANGLE_VARIANCE_RANGE: RangeInclusive<i32> = 1..=100;

/// Parameter collaborator that edits values and requests regenerations.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterPanel {
    parameters: GenerationParameters,
}

impl ParameterPanel {
    /// Creates a panel seeded with `parameters`.
    #[must_use]
    pub const fn new(parameters: GenerationParameters) -> Self {
        Self { parameters }
    }

    /// Parameters currently shown by the panel.
    #[must_use]
    pub const fn parameters(&self) -> &GenerationParameters {
        &self.parameters
    }

    /// Adopts the controller's live parameters, e.g. after a toggle.
    pub fn sync(&mut self, parameters: &GenerationParameters) {
        self.parameters = *parameters;
    }

    /// Selects the next rule set, stopping at the last catalogued one.
    pub fn next_rule_set(&mut self) {
        let current = self.parameters.rule_set.get();
        if current < RuleSetId::LAST.get() {
            self.parameters.rule_set = RuleSetId::new(current + 1);
        }
    }

    /// Selects the previous rule set, stopping at the first catalogued one.
    pub fn previous_rule_set(&mut self) {
        let current = self.parameters.rule_set.get();
        if current > RuleSetId::FIRST.get() {
            self.parameters.rule_set = RuleSetId::new(current - 1);
        }
    }

    /// Sets the number of rewrite passes.
    pub fn set_iterations(&mut self, iterations: u32) {
        self.parameters.iterations =
            iterations.clamp(*ITERATION_RANGE.start(), *ITERATION_RANGE.end());
    }

    /// Adds one rewrite pass.
    pub fn increase_iterations(&mut self) {
        self.set_iterations(self.parameters.iterations.saturating_add(1));
    }

    /// Removes one rewrite pass.
    pub fn decrease_iterations(&mut self) {
        self.set_iterations(self.parameters.iterations.saturating_sub(1));
    }

    /// Sets the branching angle.
    pub fn set_angle(&mut self, degrees: f32) {
        self.parameters.angle = ANGLE_RANGE.clamp(degrees);
    }

    /// Sets the branch length.
    pub fn set_branch_length(&mut self, length: f32) {
        self.parameters.branch_length = BRANCH_LENGTH_RANGE.clamp(length);
    }

    /// Sets the branch width.
    pub fn set_branch_width(&mut self, width: f32) {
        self.parameters.branch_width = BRANCH_WIDTH_RANGE.clamp(width);
    }

    /// Sets the leaf length.
    pub fn set_leaf_length(&mut self, length: f32) {
        self.parameters.leaf_length = LEAF_LENGTH_RANGE.clamp(length);
    }

    /// Sets the leaf width at its anchor.
    pub fn set_leaf_start_width(&mut self, width: f32) {
        self.parameters.leaf_start_width = LEAF_WIDTH_RANGE.clamp(width);
    }

    /// Sets the leaf width at its tip.
    pub fn set_leaf_end_width(&mut self, width: f32) {
        self.parameters.leaf_end_width = LEAF_WIDTH_RANGE.clamp(width);
    }

    /// Sets the random variance magnitude. Ignored while random mode is off.
    pub fn set_angle_variance(&mut self, degrees: i32) {
        if self.parameters.random_mode {
            self.parameters.angle_variance =
                degrees.clamp(*ANGLE_VARIANCE_RANGE.start(), *ANGLE_VARIANCE_RANGE.end());
        }
    }

    /// Applies slider edits through the clamping setters.
    pub fn apply_sliders(&mut self, sliders: &SliderEdits) {
        if let Some(angle) = sliders.angle {
            self.set_angle(angle);
        }
        if let Some(length) = sliders.branch_length {
            self.set_branch_length(length);
        }
        if let Some(width) = sliders.branch_width {
            self.set_branch_width(width);
        }
        if let Some(length) = sliders.leaf_length {
            self.set_leaf_length(length);
        }
        if let Some(width) = sliders.leaf_start_width {
            self.set_leaf_start_width(width);
        }
        if let Some(width) = sliders.leaf_end_width {
            self.set_leaf_end_width(width);
        }
        if let Some(degrees) = sliders.angle_variance {
            self.set_angle_variance(degrees);
        }
    }

    /// Translates one frame of input into controller commands.
    ///
    /// Value edits are published first so toggles act on the edited values.
    pub fn handle(&mut self, input: &FrameInput, out: &mut Vec<Command>) {
        let before = self.parameters;

        self.apply_sliders(&input.sliders);
        if input.next_rule_set {
            self.next_rule_set();
        }
        if input.previous_rule_set {
            self.previous_rule_set();
        }
        if input.more_iterations {
            self.increase_iterations();
        }
        if input.fewer_iterations {
            self.decrease_iterations();
        }
        if input.toggle_leaf_color {
            self.parameters.random_leaf_color = !self.parameters.random_leaf_color;
        }

        if self.parameters != before {
            out.push(Command::UpdateParameters {
                parameters: self.parameters,
            });
        }

        if input.toggle_growth {
            out.push(Command::ToggleGrowthObserved);
        }
        if input.toggle_random {
            out.push(Command::ToggleRandomMode);
        }
        if input.regenerate || input.toggle_leaf_color {
            out.push(Command::RegenerateTree);
        }
    }

    /// Formatted parameter lines.
    #[must_use]
    pub fn display_lines(&self) -> Vec<String> {
        let parameters = &self.parameters;
        vec![
            format!("Rule set: {}", parameters.rule_set.get()),
            format!("Iterations: {}", parameters.iterations),
            format!("Angle: {:.2}\u{b0}", parameters.angle),
            format!("Branch length: {:.2}", parameters.branch_length),
            format!("Branch width: {:.2}", parameters.branch_width),
            format!("Leaf length: {:.2}", parameters.leaf_length),
            format!("Leaf start width: {:.2}", parameters.leaf_start_width),
            format!("Leaf end width: {:.2}", parameters.leaf_end_width),
            format!("Angle variance: {:.2}\u{b0}", parameters.angle_variance as f32),
            format!("Random mode: {}", on_off(parameters.random_mode)),
            format!("Random leaf colour: {}", on_off(parameters.random_leaf_color)),
            format!("Observe growth: {}", on_off(parameters.growth_observed)),
        ]
    }

    /// Description of the selected rule set.
    #[must_use]
    pub fn rule_description(&self) -> String {
        select_rule_set(self.parameters.rule_set).describe()
    }

    /// Overlay content for the current parameters.
    #[must_use]
    pub fn view(&self) -> PanelView {
        PanelView {
            lines: self.display_lines(),
            rule_description: self.rule_description(),
            parameters: self.parameters,
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
