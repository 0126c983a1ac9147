#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turtle interpreter that turns expanded symbol strings into geometry.
//!
//! The turtle is a plain value. [`step`] consumes a turtle and one symbol and
//! returns the advanced turtle together with the emission the symbol produced,
//! which keeps single-symbol behaviour testable without any scene. The lazy
//! [`interpret`] iterator threads the same value through a whole string.

use arbor_core::{Emission, GenerationParameters, LeafMarker, LeafMaterial, Segment, TurtleState};
use arbor_system_variance::{VarianceSlot, VarianceTable};
use glam::{Quat, Vec3};

/// Base yaw in degrees applied by `*` and `/`.
pub const YAW_DEGREES: f32 = 120.0;

/// LIFO memory of turtle states used for branching.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformStack {
    states: Vec<TurtleState>,
}

impl TransformStack {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { states: Vec::new() }
    }

    /// Saves a copy of `state`.
    pub fn push(&mut self, state: TurtleState) {
        self.states.push(state);
    }

    /// Removes the most recently saved state. Popping an empty stack yields `None`.
    pub fn pop(&mut self) -> Option<TurtleState> {
        self.states.pop()
    }

    /// Number of saved states.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.states.len()
    }

    /// Reports whether no state is saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Discards every saved state.
    pub fn clear(&mut self) {
        self.states.clear();
    }
}

/// Complete interpreter state for one pass over a symbol string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Turtle {
    state: TurtleState,
    stack: TransformStack,
    last_tip: Option<TurtleState>,
}

impl Turtle {
    /// Turtle at the origin with identity orientation and an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: TurtleState::ORIGIN,
            stack: TransformStack::new(),
            last_tip: None,
        }
    }

    /// Turtle starting from an explicit state.
    #[must_use]
    pub const fn at(state: TurtleState) -> Self {
        Self {
            state,
            stack: TransformStack::new(),
            last_tip: None,
        }
    }

    /// Current position and orientation.
    #[must_use]
    pub const fn state(&self) -> TurtleState {
        self.state
    }

    /// Saved branch states.
    #[must_use]
    pub const fn stack(&self) -> &TransformStack {
        &self.stack
    }

    /// State recorded after the most recent forward move, if any.
    #[must_use]
    pub const fn last_tip(&self) -> Option<TurtleState> {
        self.last_tip
    }

    /// Returns the turtle to the origin and forgets all saved states.
    pub fn reset(&mut self) {
        self.state = TurtleState::ORIGIN;
        self.stack.clear();
        self.last_tip = None;
    }
}

/// Everything besides the turtle that influences a symbol's effect.
#[derive(Clone, Copy, Debug)]
pub struct InterpretContext<'a> {
    parameters: &'a GenerationParameters,
    variance: &'a VarianceTable,
    leaf_material: LeafMaterial,
    emit_branches: bool,
    emit_leaves: bool,
}

impl<'a> InterpretContext<'a> {
    /// Context emitting both branches and leaves with the default leaf material.
    #[must_use]
    pub const fn new(parameters: &'a GenerationParameters, variance: &'a VarianceTable) -> Self {
        Self {
            parameters,
            variance,
            leaf_material: None,
            emit_branches: true,
            emit_leaves: true,
        }
    }

    /// Overrides the material assigned to emitted leaves.
    #[must_use]
    pub const fn with_leaf_material(mut self, material: LeafMaterial) -> Self {
        self.leaf_material = material;
        self
    }

    /// Enables or disables each emission kind. Disabled kinds still move the turtle.
    #[must_use]
    pub const fn with_emission(mut self, branches: bool, leaves: bool) -> Self {
        self.emit_branches = branches;
        self.emit_leaves = leaves;
        self
    }

    /// Parameters used for lengths, widths and angles.
    #[must_use]
    pub const fn parameters(&self) -> &'a GenerationParameters {
        self.parameters
    }

    fn perturbed(&self, base: f32, slot: VarianceSlot) -> f32 {
        base + self.parameters.effective_variance() * self.variance.slot(slot)
    }
}

/// Applies `symbol` to `turtle`, returning the advanced turtle and any emission.
///
/// Unknown symbols leave the turtle untouched. A `]` without a matching `[`
/// keeps the current state but may still emit a leaf.
#[must_use]
pub fn step(
    mut turtle: Turtle,
    symbol: char,
    context: &InterpretContext<'_>,
) -> (Turtle, Option<Emission>) {
    let parameters = context.parameters;
    let emission = match symbol {
        'F' | 'G' => {
            let start = turtle.state.position;
            let end = start + turtle.state.orientation * Vec3::Y * parameters.branch_length;
            turtle.state.position = end;
            turtle.last_tip = Some(turtle.state);

            context.emit_branches.then_some(Emission::Segment(Segment {
                start,
                end,
                width: parameters.branch_width,
            }))
        }
        '*' => {
            let degrees = context.perturbed(YAW_DEGREES, VarianceSlot::Yaw);
            turtle.state.orientation = yaw(degrees) * turtle.state.orientation;
            None
        }
        '/' => {
            let degrees = context.perturbed(YAW_DEGREES, VarianceSlot::YawInverse);
            turtle.state.orientation = yaw(-degrees) * turtle.state.orientation;
            None
        }
        '[' => {
            turtle.stack.push(turtle.state);
            None
        }
        ']' => {
            if let Some(saved) = turtle.stack.pop() {
                turtle.state = saved;
            }

            match turtle.last_tip {
                Some(tip) if context.emit_leaves => Some(Emission::Leaf(LeafMarker {
                    anchor: tip.position,
                    orientation: tip.orientation,
                    length: parameters.leaf_length,
                    start_width: parameters.leaf_start_width,
                    end_width: parameters.leaf_end_width,
                    material: context.leaf_material,
                })),
                _ => None,
            }
        }
        '+' => {
            let degrees = context.perturbed(parameters.angle, VarianceSlot::Roll);
            turtle.state.orientation = turtle.state.orientation * roll(degrees);
            None
        }
        '-' => {
            let degrees = context.perturbed(parameters.angle, VarianceSlot::RollInverse);
            turtle.state.orientation = turtle.state.orientation * roll(-degrees);
            None
        }
        _ => None,
    };

    (turtle, emission)
}

fn yaw(degrees: f32) -> Quat {
    Quat::from_rotation_y(degrees.to_radians())
}

fn roll(degrees: f32) -> Quat {
    Quat::from_rotation_z(degrees.to_radians())
}

/// Lazily interprets `symbols`, yielding one item per symbol.
#[must_use]
pub fn interpret<'s, 'c>(symbols: &'s str, context: InterpretContext<'c>) -> Interpretation<'s, 'c> {
    Interpretation {
        symbols: symbols.chars(),
        context,
        turtle: Turtle::new(),
    }
}

/// Iterator produced by [`interpret`].
#[derive(Debug)]
pub struct Interpretation<'s, 'c> {
    symbols: std::str::Chars<'s>,
    context: InterpretContext<'c>,
    turtle: Turtle,
}

impl Interpretation<'_, '_> {
    /// Turtle after the symbols consumed so far.
    #[must_use]
    pub fn turtle(&self) -> &Turtle {
        &self.turtle
    }

    /// Drains the remaining symbols, keeping only actual emissions.
    #[must_use]
    pub fn emissions(self) -> Vec<Emission> {
        self.flatten().collect()
    }
}

impl Iterator for Interpretation<'_, '_> {
    type Item = Option<Emission>;

    fn next(&mut self) -> Option<Self::Item> {
        let symbol = self.symbols.next()?;
        let turtle = std::mem::take(&mut self.turtle);
        let (turtle, emission) = step(turtle, symbol, &self.context);
        self.turtle = turtle;
        Some(emission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn parameters() -> GenerationParameters {
        GenerationParameters {
            angle: 90.0,
            branch_length: 2.0,
            branch_width: 0.5,
            ..GenerationParameters::default()
        }
    }

    fn approx(actual: Vec3, expected: Vec3) -> bool {
        actual.abs_diff_eq(expected, EPSILON)
    }

    #[test]
    fn forward_moves_along_local_up_and_emits_segment() {
        let parameters = parameters();
        let context = InterpretContext::new(&parameters, &VarianceTable::ZERO);

        let (turtle, emission) = step(Turtle::new(), 'F', &context);

        assert!(approx(turtle.state().position, Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(turtle.last_tip(), Some(turtle.state()));
        assert_eq!(
            emission,
            Some(Emission::Segment(Segment {
                start: Vec3::ZERO,
                end: turtle.state().position,
                width: 0.5,
            }))
        );
    }

    #[test]
    fn roll_turns_heading_about_forward_axis() {
        let parameters = parameters();
        let context = InterpretContext::new(&parameters, &VarianceTable::ZERO);

        let (turtle, emission) = step(Turtle::new(), '+', &context);
        assert!(emission.is_none());
        assert!(approx(turtle.state().heading(), Vec3::new(-1.0, 0.0, 0.0)));

        let (turtle, _) = step(turtle, '-', &context);
        assert!(approx(turtle.state().heading(), Vec3::Y));
    }

    #[test]
    fn yaw_pair_cancels_without_variance() {
        let parameters = parameters();
        let context = InterpretContext::new(&parameters, &VarianceTable::ZERO);

        let (turtle, _) = step(Turtle::new(), '+', &context);
        let before = turtle.state().heading();
        let (turtle, _) = step(turtle, '*', &context);
        let yawed = turtle.state().heading();
        let (turtle, _) = step(turtle, '/', &context);

        assert!(yawed.y.abs() < EPSILON, "yaw keeps the heading horizontal");
        assert!(!approx(yawed, before));
        assert!(approx(turtle.state().heading(), before));
    }

    #[test]
    fn variance_applies_only_in_random_mode() {
        let mut values = [0.0; arbor_system_variance::VARIANCE_CAPACITY];
        values[VarianceSlot::Roll as usize] = 1.0;
        let variance = VarianceTable::from_values(values);

        let mut parameters = GenerationParameters {
            angle: 30.0,
            angle_variance: 60,
            ..GenerationParameters::default()
        };
        let (calm, _) = step(
            Turtle::new(),
            '+',
            &InterpretContext::new(&parameters, &variance),
        );

        parameters.random_mode = true;
        let (perturbed, _) = step(
            Turtle::new(),
            '+',
            &InterpretContext::new(&parameters, &variance),
        );

        let calm_angle = calm.state().heading().angle_between(Vec3::Y).to_degrees();
        let perturbed_angle = perturbed.state().heading().angle_between(Vec3::Y).to_degrees();
        assert!((calm_angle - 30.0).abs() < 1e-3);
        assert!((perturbed_angle - 90.0).abs() < 1e-3);
    }

    #[test]
    fn bracket_restores_saved_state_and_leaves_at_tip() {
        let parameters = parameters();
        let context = InterpretContext::new(&parameters, &VarianceTable::ZERO)
            .with_leaf_material(Some(arbor_core::MaterialId::new(2)));

        let mut turtle = Turtle::new();
        for symbol in "[+F".chars() {
            turtle = step(turtle, symbol, &context).0;
        }
        let tip = turtle.state();
        let (turtle, emission) = step(turtle, ']', &context);

        assert_eq!(turtle.state(), TurtleState::ORIGIN);
        assert!(turtle.stack().is_empty());
        match emission {
            Some(Emission::Leaf(leaf)) => {
                assert_eq!(leaf.anchor, tip.position);
                assert_eq!(leaf.orientation, tip.orientation);
                assert_eq!(leaf.material, Some(arbor_core::MaterialId::new(2)));
            }
            other => panic!("expected a leaf, got {other:?}"),
        }
    }

    #[test]
    fn excess_close_keeps_state() {
        let parameters = parameters();
        let context = InterpretContext::new(&parameters, &VarianceTable::ZERO);

        let mut turtle = Turtle::new();
        for symbol in "F+F".chars() {
            turtle = step(turtle, symbol, &context).0;
        }
        let before = turtle.state();
        let (turtle, _) = step(turtle, ']', &context);

        assert_eq!(turtle.state(), before);
        assert_eq!(turtle.stack().depth(), 0);
    }

    #[test]
    fn close_before_any_branch_emits_nothing() {
        let parameters = parameters();
        let context = InterpretContext::new(&parameters, &VarianceTable::ZERO);
        let (_, emission) = step(Turtle::new(), ']', &context);
        assert!(emission.is_none());
    }

    #[test]
    fn unknown_symbols_are_ignored() {
        let parameters = parameters();
        let context = InterpretContext::new(&parameters, &VarianceTable::ZERO);
        let (turtle, emission) = step(Turtle::new(), 'X', &context);
        assert_eq!(turtle, Turtle::new());
        assert!(emission.is_none());
    }

    #[test]
    fn disabled_emission_still_advances_turtle() {
        let parameters = parameters();
        let context =
            InterpretContext::new(&parameters, &VarianceTable::ZERO).with_emission(false, false);

        let mut interpretation = interpret("F[F]", context);
        let emitted: Vec<_> = interpretation.by_ref().flatten().collect();

        assert!(emitted.is_empty());
        assert!(approx(
            interpretation.turtle().state().position,
            Vec3::new(0.0, 2.0, 0.0)
        ));
        assert!(interpretation.turtle().last_tip().is_some());
    }

    #[test]
    fn reset_returns_to_origin() {
        let parameters = parameters();
        let context = InterpretContext::new(&parameters, &VarianceTable::ZERO);
        let mut turtle = Turtle::new();
        for symbol in "[F+".chars() {
            turtle = step(turtle, symbol, &context).0;
        }
        turtle.reset();
        assert_eq!(turtle, Turtle::new());
    }
}
