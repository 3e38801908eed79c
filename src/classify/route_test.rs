use super::*;

fn routes() -> Vec<RouteAlias> {
    vec![
        RouteAlias {
            name: "12".to_string(),
            aliases: vec!["route 12".to_string(), "r12".to_string()],
        },
        RouteAlias {
            name: "Airport Express".to_string(),
            aliases: vec!["AX".to_string(), "airport bus".to_string()],
        },
    ]
}

#[test]
fn stub_is_always_absent() {
    let c = StubClassifier;
    assert_eq!(c.classify("route 12 bus 4521 delayed"), RouteMatch::default());
}

#[test]
fn stub_survives_hostile_input() {
    let c = StubClassifier;
    let long = "x".repeat(1_000_000);
    for text in ["", "🚌🚏⏰", "\0\u{1}\u{fffd}", long.as_str()] {
        let m = c.classify(text);
        assert!(m.route.is_none() && m.bus.is_none());
    }
}

#[test]
fn alias_matches_case_insensitively() {
    let c = AliasClassifier::new(&routes(), None).unwrap();
    assert_eq!(c.classify("R12 is late").route.as_deref(), Some("12"));
    assert_eq!(
        c.classify("took the ax to the terminal").route.as_deref(),
        Some("Airport Express")
    );
}

#[test]
fn route_name_is_an_implicit_alias() {
    let c = AliasClassifier::new(&routes(), None).unwrap();
    assert_eq!(c.classify("12 never came").route.as_deref(), Some("12"));
}

#[test]
fn alias_requires_word_boundaries() {
    let c = AliasClassifier::new(&routes(), None).unwrap();
    assert_eq!(c.classify("relax, axles are fine").route, None);
    assert_eq!(c.classify("call 112").route, None);
}

#[test]
fn first_configured_route_wins() {
    let c = AliasClassifier::new(&routes(), None).unwrap();
    assert_eq!(c.classify("r12 or AX?").route.as_deref(), Some("12"));
}

#[test]
fn bus_number_from_default_pattern() {
    let c = AliasClassifier::new(&routes(), Some(DEFAULT_BUS_PATTERN)).unwrap();
    let m = c.classify("Route 12, bus no. 4521 broke down");
    assert_eq!(m.route.as_deref(), Some("12"));
    assert_eq!(m.bus.as_deref(), Some("4521"));
    assert_eq!(c.classify("Bus #77 skipped my stop").bus.as_deref(), Some("77"));
}

#[test]
fn alias_classifier_is_total() {
    let c = AliasClassifier::new(&routes(), Some(DEFAULT_BUS_PATTERN)).unwrap();
    let long = "route ".repeat(200_000);
    for text in ["", "🚌", "\u{202e}12\u{202c}", long.as_str()] {
        let _ = c.classify(text);
    }
}

#[test]
fn regex_metacharacters_in_aliases_are_literal() {
    let routes = vec![RouteAlias {
        name: "7A".to_string(),
        aliases: vec!["7a (night)".to_string()],
    }];
    let c = AliasClassifier::new(&routes, None).unwrap();
    assert_eq!(c.classify("the 7a (night) was packed").route.as_deref(), Some("7A"));
}

#[test]
fn bus_pattern_without_group_is_rejected() {
    let err = AliasClassifier::new(&routes(), Some(r"bus \d+")).unwrap_err();
    assert!(err.to_string().contains("capture group"), "got: {err}");
}

#[test]
fn invalid_bus_pattern_is_config_error() {
    let err = AliasClassifier::new(&routes(), Some("(unclosed")).unwrap_err();
    assert!(matches!(err, SyncError::Config(_)));
}

#[test]
fn empty_route_name_is_rejected() {
    let routes = vec![RouteAlias {
        name: "  ".to_string(),
        aliases: vec![],
    }];
    assert!(AliasClassifier::new(&routes, None).is_err());
}
