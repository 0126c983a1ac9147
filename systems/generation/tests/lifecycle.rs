use std::time::Duration;

use arbor_core::{Command, Event, GenerationParameters, RuleSetId};
use arbor_scene::{query, SceneStore};
use arbor_system_generation::{Config, GenerationController, Phase};

const FRAME: Duration = Duration::from_millis(16);

fn parameters(rule_set: u32, iterations: u32, growth_observed: bool) -> GenerationParameters {
    GenerationParameters {
        rule_set: RuleSetId::new(rule_set),
        iterations,
        growth_observed,
        ..GenerationParameters::default()
    }
}

fn controller(parameters: GenerationParameters) -> GenerationController<SceneStore> {
    GenerationController::new(Config::new(7), parameters, Some(SceneStore::new()))
}

fn forward_symbols(symbols: &str) -> usize {
    symbols.chars().filter(|c| matches!(c, 'F' | 'G')).count()
}

fn scene(controller: &GenerationController<SceneStore>) -> &SceneStore {
    controller.scene().expect("scene attached")
}

#[test]
fn instant_regeneration_emits_one_segment_per_forward_symbol() {
    for rule_set in 1..=9 {
        let mut controller = controller(parameters(rule_set, 3, false));
        let mut events = Vec::new();
        controller.apply(Command::RegenerateTree, &mut events);

        assert_eq!(controller.phase(), Phase::Complete);
        let symbols = controller.expanded().expect("run completed");
        assert_eq!(
            query::active_segment_count(scene(&controller)),
            forward_symbols(symbols),
            "rule set {rule_set}"
        );
    }
}

#[test]
fn regeneration_replaces_previous_tree() {
    let mut controller = controller(parameters(4, 2, false));
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);
    let first = query::active_segment_count(scene(&controller));

    controller.apply(Command::RegenerateTree, &mut events);

    let store = scene(&controller);
    assert_eq!(query::active_segment_count(store), first);
    assert_eq!(query::stored_segment_count(store), first);
    assert_eq!(query::clear_count(store), 2);
}

#[test]
fn stepwise_run_takes_one_tick_per_pass_and_symbol() {
    let iterations = 2;
    let mut controller = controller(parameters(4, iterations, true));
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);

    assert_eq!(
        controller.phase(),
        Phase::ExpandingGrammar {
            completed: 0,
            iterations
        }
    );

    let mut ticks = 0;
    while controller.phase() != Phase::Complete {
        controller.apply(Command::Tick { dt: FRAME }, &mut events);
        ticks += 1;
        assert!(ticks < 10_000, "stepwise run never completed");
    }

    let symbols = controller.expanded().expect("run completed");
    assert_eq!(ticks, iterations as usize + symbols.chars().count());
    assert_eq!(
        query::active_segment_count(scene(&controller)),
        forward_symbols(symbols)
    );
}

#[test]
fn stepwise_run_reports_each_pass() {
    let mut controller = controller(parameters(4, 3, true));
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);
    for _ in 0..3 {
        controller.apply(Command::Tick { dt: FRAME }, &mut events);
    }

    let passes: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::GrammarExpanded { pass, .. } => Some(*pass),
            _ => None,
        })
        .collect();
    assert_eq!(passes, vec![1, 2, 3]);
    assert!(matches!(
        controller.phase(),
        Phase::InterpretingSymbols { interpreted: 0, .. }
    ));
}

#[test]
fn regenerating_mid_interpretation_discards_partial_tree() {
    let mut controller = controller(parameters(4, 1, true));
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);

    // One pass, then "F[+F]" worth of symbols.
    for _ in 0..6 {
        controller.apply(Command::Tick { dt: FRAME }, &mut events);
    }
    let partial = query::active_segment_count(scene(&controller))
        + query::active_leaf_count(scene(&controller));
    assert_eq!(partial, 3);

    events.clear();
    controller.apply(Command::RegenerateTree, &mut events);

    assert_eq!(events[0], Event::RunCancelled { discarded: partial });
    assert!(matches!(events[1], Event::RegenerationStarted { .. }));
    assert_eq!(query::stored_segment_count(scene(&controller)), 0);
    assert_eq!(query::stored_leaf_count(scene(&controller)), 0);
    assert!(controller.emitted().is_empty());
}

#[test]
fn poll_ignores_drift_below_tolerance() {
    let base = parameters(2, 2, false);
    let mut controller = controller(base);
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);
    events.clear();

    let drifted = GenerationParameters {
        angle: base.angle + 0.005,
        ..base
    };
    controller.apply(Command::UpdateParameters { parameters: drifted }, &mut events);
    controller.apply(
        Command::Tick {
            dt: Duration::from_millis(250),
        },
        &mut events,
    );

    assert!(events.is_empty());
}

#[test]
fn poll_regenerates_after_interval_elapses() {
    let base = parameters(2, 2, false);
    let mut controller = controller(base);
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);
    events.clear();

    let edited = GenerationParameters {
        angle: base.angle + 5.0,
        ..base
    };
    controller.apply(Command::UpdateParameters { parameters: edited }, &mut events);
    controller.apply(
        Command::Tick {
            dt: Duration::from_millis(100),
        },
        &mut events,
    );
    assert!(events.is_empty(), "poll fired before its interval");

    controller.apply(
        Command::Tick {
            dt: Duration::from_millis(100),
        },
        &mut events,
    );
    assert_eq!(events[0], Event::ParametersChanged);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::GenerationCompleted { .. })));
    assert_eq!(controller.buffered_parameters(), &edited);
}

#[test]
fn toggling_growth_observation_switches_pacing() {
    let mut controller = controller(parameters(3, 2, false));
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);
    assert_eq!(controller.phase(), Phase::Complete);

    controller.apply(Command::ToggleGrowthObserved, &mut events);
    assert!(controller.parameters().growth_observed);
    assert!(controller.is_running());
    assert_eq!(query::stored_segment_count(scene(&controller)), 0);

    controller.apply(Command::ToggleGrowthObserved, &mut events);
    assert!(!controller.parameters().growth_observed);
    assert_eq!(controller.phase(), Phase::Complete);
}

#[test]
fn leaving_random_mode_resets_variance() {
    let start = GenerationParameters {
        random_mode: true,
        angle_variance: 40,
        ..parameters(9, 2, false)
    };
    let mut controller = controller(start);
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);
    events.clear();

    controller.apply(Command::ToggleRandomMode, &mut events);

    assert!(!controller.parameters().random_mode);
    assert_eq!(controller.parameters().angle_variance, 0);
    assert!(matches!(events[0], Event::RegenerationStarted { .. }));

    // The toggle already buffered the change, so the poll stays quiet.
    events.clear();
    controller.apply(
        Command::Tick {
            dt: Duration::from_millis(300),
        },
        &mut events,
    );
    assert!(events.is_empty());
}

#[test]
fn generation_without_scene_still_completes() {
    let mut controller: GenerationController<SceneStore> =
        GenerationController::new(Config::default(), parameters(4, 1, false), None);
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);

    assert_eq!(controller.phase(), Phase::Complete);
    assert!(controller.emitted().is_empty());
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::SegmentEmitted { .. })));
    assert_eq!(
        events.last(),
        Some(&Event::GenerationCompleted {
            segments: 4,
            leaves: 2
        })
    );
}

#[test]
fn disabled_leaves_are_not_emitted() {
    let config = Config::new(7).with_emission(true, false);
    let mut controller =
        GenerationController::new(config, parameters(4, 2, false), Some(SceneStore::new()));
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);

    assert_eq!(query::active_leaf_count(scene(&controller)), 0);
    assert!(query::active_segment_count(scene(&controller)) > 0);
}

fn interpret_a_few_symbols(controller: &mut GenerationController<SceneStore>) {
    let mut events = Vec::new();
    controller.apply(Command::RegenerateTree, &mut events);

    // One pass, then "F[+F]" worth of symbols.
    for _ in 0..6 {
        controller.apply(Command::Tick { dt: FRAME }, &mut events);
    }
    assert!(matches!(
        controller.phase(),
        Phase::InterpretingSymbols { interpreted: 5, .. }
    ));
    assert_eq!(query::active_segment_count(scene(controller)), 2);
    assert_eq!(query::active_leaf_count(scene(controller)), 1);
}

#[test]
fn cancelling_mid_interpretation_discards_partial_tree() {
    let mut controller = controller(parameters(4, 1, true));
    interpret_a_few_symbols(&mut controller);

    let mut events = Vec::new();
    controller.cancel(&mut events);

    assert_eq!(events, vec![Event::RunCancelled { discarded: 3 }]);
    assert_eq!(controller.phase(), Phase::Idle);
    assert!(controller.expanded().is_none());
    assert!(controller.emitted().is_empty());
    let store = scene(&controller);
    assert_eq!(query::active_segment_count(store), 0);
    assert_eq!(query::active_leaf_count(store), 0);
    assert_eq!(query::stored_segment_count(store), 0);

    controller.cancel(&mut events);
    assert_eq!(events.len(), 1);
}

#[test]
fn toggling_growth_mid_interpretation_replaces_partial_tree() {
    let mut controller = controller(parameters(4, 1, true));
    interpret_a_few_symbols(&mut controller);

    let mut events = Vec::new();
    controller.apply(Command::ToggleGrowthObserved, &mut events);

    assert_eq!(events[0], Event::RunCancelled { discarded: 3 });
    assert_eq!(controller.phase(), Phase::Complete);
    let store = scene(&controller);
    assert_eq!(query::active_segment_count(store), 4);
    assert_eq!(query::stored_segment_count(store), 4);
    assert_eq!(query::stored_leaf_count(store), 2);
}

#[test]
fn toggling_random_mode_mid_interpretation_restarts_growth() {
    let mut controller = controller(parameters(4, 1, true));
    interpret_a_few_symbols(&mut controller);

    let mut events = Vec::new();
    controller.apply(Command::ToggleRandomMode, &mut events);

    assert_eq!(events[0], Event::RunCancelled { discarded: 3 });
    assert!(controller.parameters().random_mode);
    assert_eq!(
        controller.phase(),
        Phase::ExpandingGrammar {
            completed: 0,
            iterations: 1
        }
    );
    assert_eq!(query::stored_segment_count(scene(&controller)), 0);
    assert_eq!(query::stored_leaf_count(scene(&controller)), 0);
    assert!(controller.emitted().is_empty());
}
