#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Arbor adapters.

mod panel;

pub use panel::{
    ParameterPanel, SliderRange, ANGLE_RANGE, ANGLE_VARIANCE_RANGE, BRANCH_LENGTH_RANGE,
    BRANCH_WIDTH_RANGE, ITERATION_RANGE, LEAF_LENGTH_RANGE, LEAF_WIDTH_RANGE,
};

use anyhow::Result as AnyResult;
use arbor_core::{GenerationParameters, LeafMarker, Segment};
use glam::Vec3;
use std::time::Duration;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Bark colour used for branch segments.
pub const DEFAULT_BRANCH_COLOR: Color = Color::from_rgb_u8(110, 78, 48);

/// Leaf colour used when no material was drawn.
pub const DEFAULT_LEAF_COLOR: Color = Color::from_rgb_u8(72, 160, 64);

/// Leaf materials available to random leaf colouring.
pub const DEFAULT_LEAF_PALETTE: [Color; 5] = [
    Color::from_rgb_u8(72, 160, 64),
    Color::from_rgb_u8(150, 190, 60),
    Color::from_rgb_u8(224, 176, 48),
    Color::from_rgb_u8(214, 96, 40),
    Color::from_rgb_u8(170, 40, 52),
];

/// Axis-aligned box enclosing every drawn primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Corner with the smallest coordinates.
    pub min: Vec3,
    /// Corner with the largest coordinates.
    pub max: Vec3,
}

impl Bounds {
    fn around(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Radius of the sphere through the box corners.
    #[must_use]
    pub fn radius(&self) -> f32 {
        (self.max - self.min).length() * 0.5
    }
}

/// Content shown by the parameter overlay.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanelView {
    /// One formatted line per parameter.
    pub lines: Vec<String>,
    /// Description of the selected rule set.
    pub rule_description: String,
    /// Values the sliders are positioned at.
    pub parameters: GenerationParameters,
}

/// Snapshot of the tree that backends draw each frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeScene {
    /// Active branch segments.
    pub segments: Vec<Segment>,
    /// Active leaf markers.
    pub leaves: Vec<LeafMarker>,
    /// Colour applied to every segment.
    pub branch_color: Color,
    /// Colour applied to leaves without a material.
    pub leaf_color: Color,
    /// Colours indexed by leaf material.
    pub leaf_palette: Vec<Color>,
    /// Parameter overlay, if the adapter shows one.
    pub panel: Option<PanelView>,
}

impl TreeScene {
    /// Creates an empty scene with the provided colours.
    #[must_use]
    pub fn new(branch_color: Color, leaf_color: Color, leaf_palette: Vec<Color>) -> Self {
        Self {
            segments: Vec::new(),
            leaves: Vec::new(),
            branch_color,
            leaf_color,
            leaf_palette,
            panel: None,
        }
    }

    /// Replaces the drawn geometry.
    pub fn replace_geometry(&mut self, segments: Vec<Segment>, leaves: Vec<LeafMarker>) {
        self.segments = segments;
        self.leaves = leaves;
    }

    /// Colour of `leaf`, falling back to the default leaf colour for missing materials.
    #[must_use]
    pub fn leaf_color_for(&self, leaf: &LeafMarker) -> Color {
        leaf.material
            .and_then(|material| usize::try_from(material.get()).ok())
            .and_then(|index| self.leaf_palette.get(index).copied())
            .unwrap_or(self.leaf_color)
    }

    /// Box enclosing every segment and leaf, or `None` for an empty scene.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self
            .segments
            .iter()
            .flat_map(|segment| [segment.start, segment.end])
            .chain(self.leaves.iter().flat_map(|leaf| [leaf.anchor, leaf.tip()]));

        let mut bounds = Bounds::around(points.next()?);
        for point in points {
            bounds.include(point);
        }
        Some(bounds)
    }
}

impl Default for TreeScene {
    fn default() -> Self {
        Self::new(
            DEFAULT_BRANCH_COLOR,
            DEFAULT_LEAF_COLOR,
            DEFAULT_LEAF_PALETTE.to_vec(),
        )
    }
}

/// Slider values changed through the overlay. `None` leaves a value untouched.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SliderEdits {
    /// Branching angle in degrees.
    pub angle: Option<f32>,
    /// Distance travelled per forward symbol.
    pub branch_length: Option<f32>,
    /// Segment width.
    pub branch_width: Option<f32>,
    /// Leaf length.
    pub leaf_length: Option<f32>,
    /// Leaf width at its anchor.
    pub leaf_start_width: Option<f32>,
    /// Leaf width at its tip.
    pub leaf_end_width: Option<f32>,
    /// Random variance magnitude in degrees.
    pub angle_variance: Option<i32>,
}

impl SliderEdits {
    /// Reports whether no slider moved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Combines two edit sets, preferring the values in `newer`.
    #[must_use]
    pub fn merge(self, newer: Self) -> Self {
        Self {
            angle: newer.angle.or(self.angle),
            branch_length: newer.branch_length.or(self.branch_length),
            branch_width: newer.branch_width.or(self.branch_width),
            leaf_length: newer.leaf_length.or(self.leaf_length),
            leaf_start_width: newer.leaf_start_width.or(self.leaf_start_width),
            leaf_end_width: newer.leaf_end_width.or(self.leaf_end_width),
            angle_variance: newer.angle_variance.or(self.angle_variance),
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Discard the tree and grow a new one.
    pub regenerate: bool,
    /// Switch between instant and stepwise growth.
    pub toggle_growth: bool,
    /// Switch random angle variance on or off.
    pub toggle_random: bool,
    /// Switch random leaf colouring on or off.
    pub toggle_leaf_color: bool,
    /// Select the next rule set.
    pub next_rule_set: bool,
    /// Select the previous rule set.
    pub previous_rule_set: bool,
    /// Add one rewrite pass.
    pub more_iterations: bool,
    /// Remove one rewrite pass.
    pub fewer_iterations: bool,
    /// Slider edits made through the overlay.
    pub sliders: SliderEdits,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: TreeScene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: TreeScene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Arbor trees.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, and may mutate the scene before
    /// it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut TreeScene) + 'static;
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::MaterialId;
    use glam::Quat;

    fn leaf(material: Option<MaterialId>) -> LeafMarker {
        LeafMarker {
            anchor: Vec3::new(0.0, 3.0, 0.0),
            orientation: Quat::IDENTITY,
            length: 2.0,
            start_width: 3.0,
            end_width: 2.0,
            material,
        }
    }

    #[test]
    fn leaf_colour_follows_material() {
        let scene = TreeScene::default();
        assert_eq!(
            scene.leaf_color_for(&leaf(Some(MaterialId::new(2)))),
            DEFAULT_LEAF_PALETTE[2]
        );
    }

    #[test]
    fn leaf_colour_falls_back_for_missing_material() {
        let scene = TreeScene::default();
        assert_eq!(scene.leaf_color_for(&leaf(None)), DEFAULT_LEAF_COLOR);
        assert_eq!(
            scene.leaf_color_for(&leaf(Some(MaterialId::new(40)))),
            DEFAULT_LEAF_COLOR
        );
    }

    #[test]
    fn newer_slider_edits_win() {
        let older = SliderEdits {
            angle: Some(10.0),
            leaf_length: Some(4.0),
            ..SliderEdits::default()
        };
        let newer = SliderEdits {
            angle: Some(30.0),
            ..SliderEdits::default()
        };

        let merged = older.merge(newer);
        assert_eq!(merged.angle, Some(30.0));
        assert_eq!(merged.leaf_length, Some(4.0));
        assert!(merged.branch_width.is_none());
        assert!(SliderEdits::default().is_empty());
        assert!(!merged.is_empty());
    }

    #[test]
    fn empty_scene_has_no_bounds() {
        assert!(TreeScene::default().bounds().is_none());
    }

    #[test]
    fn bounds_cover_segments_and_leaf_tips() {
        let mut scene = TreeScene::default();
        scene.replace_geometry(
            vec![Segment {
                start: Vec3::new(-1.0, 0.0, 0.0),
                end: Vec3::new(0.0, 3.0, 0.0),
                width: 1.0,
            }],
            vec![leaf(None)],
        );

        let bounds = scene.bounds().expect("scene has geometry");
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(bounds.center(), Vec3::new(-0.5, 2.5, 0.0));
    }
}
