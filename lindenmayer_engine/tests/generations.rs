// End-to-end behavior of the rewrite engine.
//
// Each test builds an `LSystem` through the public API only (or from a JSON
// description / embedded preset) and checks a property of whole generations:
// identity for unmatched symbols, iterate-vs-step equivalence, context
// matching symmetry and branch transparency, stochastic frequencies, and
// parametric systems.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use lindenmayer_engine::classic::{parse_parametric_axiom, stochastic_productions};
use lindenmayer_engine::{
    Axiom, Direction, EngineOptions, Guarded, IgnoredSymbols, LSystem, LSystemError, Pattern,
    SeededRng, Successor, Symbol, SystemConfig, Token, presets,
};

fn plain(axiom: &str) -> LSystem {
    LSystem::new(Axiom::plain(axiom))
}

fn rendered(sys: &LSystem) -> String {
    sys.get_string(true).unwrap()
}

// ---------------------------------------------------------------------------
// Generation stepping
// ---------------------------------------------------------------------------

#[test]
fn koch_growth_after_two_iterations() {
    let mut sys = plain("F");
    sys.set_production("F", "F+F", false).unwrap();
    sys.iterate(2).unwrap();
    assert_eq!(rendered(&sys), "F+F+F+F");
}

#[test]
fn symbols_without_productions_are_unchanged() {
    let mut sys = plain("A+B-[C]");
    sys.set_production("A", "AB", false).unwrap();
    sys.apply_productions().unwrap();
    assert_eq!(rendered(&sys), "AB+B-[C]");
}

#[test]
fn iterate_equals_repeated_steps() {
    let build = || {
        let mut sys = plain("X");
        sys.set_productions([("X", "F+[[X]-X]-F[-FX]+X"), ("F", "FF")])
            .unwrap();
        sys
    };

    let mut iterated = build();
    iterated.iterate(4).unwrap();

    let mut stepped = build();
    for _ in 0..4 {
        stepped.apply_productions().unwrap();
    }

    assert_eq!(iterated.axiom(), stepped.axiom());
    assert_eq!(iterated.generation(), stepped.generation());
}

#[test]
fn stochastic_iterate_equals_repeated_steps_with_same_seed() {
    let build = || {
        let config = presets::load("stochastic_weed").unwrap();
        LSystem::from_config(&config).unwrap()
    };
    let mut iterated = build();
    iterated.iterate(3).unwrap();
    let mut stepped = build();
    for _ in 0..3 {
        stepped.apply_productions().unwrap();
    }
    assert_eq!(rendered(&iterated), rendered(&stepped));
}

#[test]
fn failing_successor_leaves_axiom_and_counter_untouched() {
    let mut sys = plain("F");
    sys.set_production("F", "FG", false).unwrap();
    sys.apply_productions().unwrap();
    sys.set_production(
        "G",
        Successor::function(|ctx| {
            if ctx.generation >= 1 {
                Err("G cannot grow further".into())
            } else {
                Ok(None)
            }
        }),
        false,
    )
    .unwrap();

    let err = sys.iterate(3).unwrap_err();
    assert!(matches!(err, LSystemError::Callback(_)));
    assert_eq!(err.to_string(), "G cannot grow further");
    assert_eq!(rendered(&sys), "FG");
    assert_eq!(sys.generation(), 1);
}

#[test]
fn callback_error_can_be_downcast() {
    #[derive(Debug)]
    struct Wilted;
    impl std::fmt::Display for Wilted {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("wilted")
        }
    }
    impl std::error::Error for Wilted {}

    let mut sys = plain("A");
    sys.set_production("A", Guarded::new("B").when(|_| Err(Wilted.into())), false)
        .unwrap();
    match sys.apply_productions() {
        Err(LSystemError::Callback(inner)) => assert!(inner.downcast_ref::<Wilted>().is_some()),
        other => panic!("expected callback error, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Context matching
// ---------------------------------------------------------------------------

#[test]
fn adjacent_matching_agrees_with_substrings() {
    let text = "ABCABD";
    let chars: Vec<char> = text.chars().collect();
    let sys = plain(text);

    for i in 0..chars.len() {
        for start in 0..chars.len() {
            for end in start + 1..=chars.len() {
                let pattern: String = chars[start..end].iter().collect();
                let k = pattern.chars().count();
                let p = Pattern::from(pattern.as_str());

                let left = sys.match_context(&p, Direction::Left, i).matched;
                let expect_left = i >= k && chars[i - k..i].iter().collect::<String>() == pattern;
                assert_eq!(left, expect_left, "left {pattern} at {i}");

                let right = sys.match_context(&p, Direction::Right, i).matched;
                let expect_right = i + 1 + k <= chars.len()
                    && chars[i + 1..i + 1 + k].iter().collect::<String>() == pattern;
                assert_eq!(right, expect_right, "right {pattern} at {i}");
            }
        }
    }
}

#[test]
fn unreferenced_branches_are_transparent() {
    for axiom in ["A[XYZ]B", "A[[Q]R]B", "A[]B", "A[B]B"] {
        let sys = plain(axiom);
        let last = axiom.chars().count() - 1;
        assert!(
            sys.match_context(&Pattern::from("B"), Direction::Right, 0).matched,
            "right across {axiom}"
        );
        assert!(
            sys.match_context(&Pattern::from("A"), Direction::Left, last).matched,
            "left across {axiom}"
        );
    }
}

#[test]
fn context_sensitive_rule() {
    let mut sys = plain("BCD");
    sys.set_production("B<C>D", "Z", false).unwrap();
    sys.apply_productions().unwrap();
    assert_eq!(rendered(&sys), "BZD");

    for other in ["BCE", "BCB", "BC", "ACD"] {
        let mut sys = plain(other);
        sys.set_production("B<C>D", "Z", false).unwrap();
        sys.apply_productions().unwrap();
        assert_eq!(rendered(&sys), other);
    }
}

#[test]
fn context_rule_sees_through_ignored_symbols_and_branches() {
    let mut sys = LSystem::with_options(EngineOptions {
        ignored_symbols: IgnoredSymbols::from_chars("+-"),
        ..EngineOptions::default()
    });
    sys.set_axiom(Axiom::plain("B+[F]C-D"));
    sys.set_production("B<C>D", "Z", false).unwrap();
    sys.apply_productions().unwrap();
    assert_eq!(rendered(&sys), "B+[F]Z-D");
}

#[test]
fn signal_propagates_one_cell_per_generation() {
    let config = presets::load("signal_propagation").unwrap();
    let mut sys = LSystem::from_config(&config).unwrap();
    let expected = [
        "abaaaaaaa",
        "aabaaaaaa",
        "aaabaaaaa",
        "aaaabaaaa",
    ];
    for want in expected {
        sys.apply_productions().unwrap();
        assert_eq!(rendered(&sys), want);
    }
}

// ---------------------------------------------------------------------------
// Stochastic productions
// ---------------------------------------------------------------------------

#[test]
fn equal_weights_converge_to_equal_frequencies() {
    const TRIALS: usize = 10_000;
    let mut sys = plain(&"F".repeat(TRIALS));
    sys.set_production(
        "F",
        stochastic_productions(vec!["A".into(), "B".into(), "C".into(), "D".into()]),
        false,
    )
    .unwrap();
    sys.set_random_source(SeededRng::new(0x5EED));
    sys.apply_productions().unwrap();

    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    for c in rendered(&sys).chars() {
        *counts.entry(c).or_default() += 1;
    }
    assert_eq!(counts.len(), 4);
    for (symbol, count) in counts {
        let freq = count as f64 / TRIALS as f64;
        assert!((freq - 0.25).abs() < 0.02, "{symbol} picked {freq:.3} of the time");
    }
}

#[test]
fn uneven_weights_skew_frequencies() {
    const TRIALS: usize = 10_000;
    let mut sys = plain(&"F".repeat(TRIALS));
    sys.set_production(
        "F",
        Successor::weighted(vec![Guarded::new("A").weight(3.0), Guarded::new("B").weight(1.0)]),
        false,
    )
    .unwrap();
    sys.set_random_source(SeededRng::new(11));
    sys.apply_productions().unwrap();

    let a = rendered(&sys).chars().filter(|&c| c == 'A').count();
    let freq = a as f64 / TRIALS as f64;
    assert!((freq - 0.75).abs() < 0.02, "A picked {freq:.3} of the time");
}

#[test]
fn same_seed_same_plant() {
    let config = presets::load("stochastic_weed").unwrap();
    let mut first = LSystem::from_config(&config).unwrap();
    let mut second = LSystem::from_config(&config).unwrap();
    first.iterate(config.iterations as usize).unwrap();
    second.iterate(config.iterations as usize).unwrap();
    assert_eq!(rendered(&first), rendered(&second));
}

// ---------------------------------------------------------------------------
// Parametric systems
// ---------------------------------------------------------------------------

#[test]
fn parametric_axiom_decodes_to_tokens() {
    let tokens = parse_parametric_axiom("A(1,2)B(3)").unwrap();
    assert_eq!(
        tokens,
        vec![Token::new("A", vec![1.0, 2.0]), Token::new("B", vec![3.0])]
    );
}

#[test]
fn parametric_growth_reads_params() {
    let mut sys = LSystem::with_options(EngineOptions {
        classic_parametric_syntax: true,
        ..EngineOptions::default()
    });
    sys.set_axiom_str("A(1)").unwrap();
    // A(x) -> A(x + 1) B(x), stopping once x reaches 3.
    sys.set_production(
        "A",
        Guarded::new(Successor::function(|ctx| {
            let x = ctx.params()[0];
            Ok(Some(vec![
                Symbol::Token(Token::new("A", vec![x + 1.0])),
                Symbol::Token(Token::new("B", vec![x])),
            ]))
        }))
        .when(|ctx| Ok(ctx.params()[0] < 3.0)),
        false,
    )
    .unwrap();
    sys.iterate(5).unwrap();

    assert_eq!(rendered(&sys), "ABB");
    assert_eq!(
        sys.get_string(false).unwrap(),
        r#"[{"symbol":"A","params":[3.0]},{"symbol":"B","params":[2.0]},{"symbol":"B","params":[1.0]}]"#
    );
}

#[test]
fn bare_characters_in_token_axiom_fail_to_render() {
    let mut sys = LSystem::new(Axiom::tokens(vec![Token::bare("A"), Token::bare("B")]));
    sys.set_production("B", "C", false).unwrap();
    sys.apply_productions().unwrap();
    assert!(matches!(
        sys.get_string(true),
        Err(LSystemError::MissingSymbol { index: 1 })
    ));
}

// ---------------------------------------------------------------------------
// Finals and presets
// ---------------------------------------------------------------------------

#[test]
fn final_pass_visits_positions_in_order() {
    let visited = Arc::new(Mutex::new(String::new()));
    let mut sys = plain("F");
    sys.set_production("F", "F[+F]", false).unwrap();
    sys.iterate(1).unwrap();

    for symbol in ["F", "+", "[", "]"] {
        let log = Arc::clone(&visited);
        sys.bind_final(symbol, move |ctx| {
            log.lock().unwrap().push_str(&ctx.symbol.name());
            Ok(())
        });
    }
    sys.final_pass().unwrap();
    assert_eq!(*visited.lock().unwrap(), "F[+F]");
}

#[test]
fn preset_finals_must_be_bound_before_the_final_pass() {
    let config = presets::load("koch_curve").unwrap();
    let mut sys = LSystem::from_config(&config).unwrap();
    assert!(matches!(
        sys.final_pass(),
        Err(LSystemError::NotInvocable { .. })
    ));

    let names: Vec<String> = sys.declared_finals().map(|(s, _)| s.to_string()).collect();
    let segments = Arc::new(Mutex::new(0usize));
    for symbol in names {
        let segments = Arc::clone(&segments);
        let is_forward = symbol == "F";
        sys.bind_final(symbol, move |_| {
            if is_forward {
                *segments.lock().unwrap() += 1;
            }
            Ok(())
        });
    }
    sys.iterate(1).unwrap();
    sys.final_pass().unwrap();
    // F-F-F-F with F -> F+F-F-F+F gives four groups of five segments.
    assert_eq!(*segments.lock().unwrap(), 20);
}

#[test]
fn fractal_plant_first_generation() {
    let config = presets::load("fractal_plant").unwrap();
    let mut sys = LSystem::from_config(&config).unwrap();
    sys.apply_productions().unwrap();
    assert_eq!(rendered(&sys), "F+[[X]-X]-F[-FX]+X");
}

#[test]
fn json_productions_keep_document_order() {
    // The guarded rule comes first in the document although "F" sorts
    // before "X<F", so every F after an X becomes Z and the weighted list
    // only handles the rest.
    let config = SystemConfig::from_json(
        r#"{
            "axiom": "XFXFXFF",
            "productions": {"X<F": "Z", "F": ["A", "B"]},
            "seed": 7
        }"#,
    )
    .unwrap();
    let mut sys = LSystem::from_config(&config).unwrap();
    sys.apply_productions().unwrap();
    let out = rendered(&sys);
    assert_eq!(&out[..6], "XZXZXZ");
    assert!(matches!(&out[6..], "A" | "B"), "last F became {out}");
}

#[test]
fn json_description_drives_the_engine() {
    let config = SystemConfig::from_json(
        r#"{
            "axiom": "A",
            "productions": {
                "A": {"successors": [
                    {"successor": "B", "weight": 0},
                    {"successor": "C", "weight": 1}
                ]}
            }
        }"#,
    )
    .unwrap();
    let mut sys = LSystem::from_config(&config).unwrap();
    sys.iterate(config.iterations as usize).unwrap();
    // A zero-weight candidate is reachable only with a draw of exactly zero,
    // and SeededRng(0) does not start there.
    assert_eq!(rendered(&sys), "C");
}
