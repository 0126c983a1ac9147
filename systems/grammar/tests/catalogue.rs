use arbor_core::RuleSetId;
use arbor_system_grammar::{catalogue, expand, select_rule_set, AXIOM};

const DOCUMENTED: [(u32, &str); 9] = [
    (1, "FF-[-F+F+F]+[+F-F-F]"),
    (2, "F[+F]F[-F]F"),
    (3, "F[+F]F[-F][F]"),
    (4, "F[+F][-F]F"),
    (5, "G[+F]G[-F]+F"),
    (6, "G[+F][-F]GF"),
    (7, "G-[[F]+F]+G[+GF]-F"),
    (8, "[G[-F+G[+GF]][*-F+G[+GF]][/-F+G[+GF]-F]]"),
    (9, "[*+GF]F[+GF][/+G-GF]"),
];

#[test]
fn single_pass_matches_documented_replacement() {
    for (id, expected) in DOCUMENTED {
        let expanded = expand(AXIOM, select_rule_set(RuleSetId::new(id)), 1).finish();
        assert_eq!(expanded, expected, "rule set {id} diverged");
    }
}

#[test]
fn zero_iterations_return_the_axiom() {
    for rule_set in catalogue() {
        let mut expansion = expand(AXIOM, rule_set, 0);
        assert!(expansion.next().is_none(), "no pass should be produced");
        assert_eq!(expansion.into_current(), AXIOM);
    }
}

#[test]
fn length_never_shrinks_across_iterations() {
    for rule_set in catalogue() {
        let mut previous = AXIOM.len();
        for pass in expand(AXIOM, rule_set, 4) {
            assert!(
                pass.len() >= previous,
                "rule set {:?} shrank from {previous} to {}",
                rule_set.id(),
                pass.len()
            );
            previous = pass.len();
        }
    }
}

#[test]
fn unknown_identifiers_degrade_to_identity() {
    for id in [0, 10, u32::MAX] {
        let rule_set = select_rule_set(RuleSetId::new(id));
        assert!(rule_set.is_identity());
        assert_eq!(rule_set.axiom(), AXIOM);
        assert_eq!(expand(AXIOM, rule_set, 6).finish(), AXIOM);
    }
}

#[test]
fn catalogue_is_ordered_by_identifier() {
    let ids: Vec<u32> = catalogue().map(|rule_set| rule_set.id().get()).collect();
    assert_eq!(ids, (1..=9).collect::<Vec<_>>());
}

#[test]
fn instant_and_stepwise_consumption_agree() {
    let rule_set = select_rule_set(RuleSetId::new(7));
    let instant = expand(AXIOM, rule_set, 3).finish();

    let mut stepwise = expand(AXIOM, rule_set, 3);
    let mut last = None;
    while let Some(pass) = stepwise.advance() {
        last = Some(pass.to_owned());
    }

    assert_eq!(last.as_deref(), Some(instant.as_str()));
}
