mod common;

use common::{counter, counter_at};
use controducer::config::{traverse, ConfigNode};
use controducer::{combine_stores, parse_configs, ConfigError, Segment, StorePath};

fn paths_by_name(node: &ConfigNode) -> Vec<(String, StorePath)> {
    traverse(node)
        .iter()
        .map(|entry| (entry.config.name().to_string(), entry.path.clone()))
        .collect()
}

/// Resolving the same graph twice gives the same paths in the same order.
#[test]
fn test_resolution_is_deterministic() {
    let graph = ConfigNode::branch([
        ("a", ConfigNode::from(counter("a"))),
        (
            "group",
            ConfigNode::branch([
                ("b", ConfigNode::from(counter("b"))),
                ("c", ConfigNode::from(counter_at("c", ["elsewhere", "c"]))),
            ]),
        ),
    ]);

    let first = paths_by_name(&graph);
    let second = paths_by_name(&graph);
    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![
            ("a".to_string(), StorePath::from("a")),
            ("b".to_string(), StorePath::from(["group", "b"])),
            ("c".to_string(), StorePath::from(["group", "elsewhere", "c"])),
        ]
    );
}

#[test]
fn test_list_entries_use_indices() {
    let graph = ConfigNode::list([counter("first"), counter("second")]);
    let paths = paths_by_name(&graph);
    assert_eq!(paths[0].1, StorePath::new(vec![Segment::Index(0)]));
    assert_eq!(paths[1].1, StorePath::new(vec![Segment::Index(1)]));
}

/// Re-rooting a combination moves every member under the new root.
#[test]
fn test_reset_root_prefixes_every_path() {
    let combined = combine_stores(
        ConfigNode::branch([("a", counter("a")), ("b", counter("b"))]),
        None,
    )
    .unwrap();
    assert!(combined.root().is_none());

    let rerooted = combined.reset_root("r");
    assert_eq!(rerooted.root(), Some(&StorePath::from("r")));
    for config in rerooted.configurations() {
        assert_eq!(config.path().first(), Some(&Segment::from("r")));
    }
    assert_eq!(rerooted.get("a").unwrap().path(), StorePath::from(["r", "a"]));

    // The original is untouched.
    assert_eq!(combined.get("a").unwrap().path(), StorePath::from("a"));
}

#[test]
fn test_sub_stores_inherit_main_root() {
    let main = counter_at("main", "app");
    let subs = ConfigNode::branch([("child", counter("child"))]);
    let combined = combine_stores(main, Some(subs)).unwrap();

    assert_eq!(combined.root(), Some(&StorePath::from("app")));
    assert_eq!(combined.get("main").unwrap().path(), StorePath::from("app"));
    assert_eq!(
        combined.get("child").unwrap().path(),
        StorePath::from(["app", "child"])
    );
    // Traversed paths stay relative.
    let child = combined.get("child").unwrap();
    assert_eq!(
        combined.traversed_paths().get(child),
        Some(&StorePath::from("child"))
    );
}

#[test]
fn test_rootless_main_store_keeps_discovered_paths() {
    let combined = combine_stores(
        counter("main"),
        Some(ConfigNode::branch([("child", counter("child"))])),
    )
    .unwrap();
    assert!(combined.root().is_none());
    assert_eq!(combined.get("child").unwrap().path(), StorePath::from("child"));

    let set = parse_configs(combined).unwrap();
    assert_eq!(set.get("main").unwrap().path(), StorePath::from("main"));
}

#[test]
fn test_nested_combination_under_key() {
    let inner = combine_stores(
        ConfigNode::branch([("x", counter("x")), ("y", counter("y"))]),
        None,
    )
    .unwrap();
    let outer = combine_stores(
        ConfigNode::branch([
            ("feature", ConfigNode::from(inner)),
            ("z", ConfigNode::from(counter("z"))),
        ]),
        None,
    )
    .unwrap();

    assert_eq!(outer.get("x").unwrap().path(), StorePath::from(["feature", "x"]));
    assert_eq!(outer.get("y").unwrap().path(), StorePath::from(["feature", "y"]));
    assert_eq!(outer.get("z").unwrap().path(), StorePath::from("z"));
}

#[test]
fn test_rooted_nested_combination_keeps_its_root() {
    let inner = combine_stores(counter_at("x", "shared"), None).unwrap();
    let outer = combine_stores(
        ConfigNode::branch([("ignored_key", ConfigNode::from(inner))]),
        None,
    )
    .unwrap();
    assert_eq!(outer.get("x").unwrap().path(), StorePath::from("shared"));
}

/// Two configs with one name fail; distinct names give a set of two.
#[test]
fn test_name_uniqueness() {
    let err = parse_configs(vec![counter("a"), counter("a")]).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateName { ref name } if name == "a"));

    let set = parse_configs(vec![counter("a"), counter("b")]).unwrap();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_equal_paths_conflict() {
    let err = parse_configs(vec![counter_at("a", "same"), counter_at("b", "same")]).unwrap_err();
    assert!(matches!(err, ConfigError::PathConflict { .. }));
}

#[test]
fn test_empty_sub_stores_are_noop() {
    let with_empty = combine_stores(
        counter_at("main", "app"),
        Some(ConfigNode::branch(Vec::<(&str, ConfigNode)>::new())),
    )
    .unwrap();
    assert_eq!(with_empty.configurations().len(), 1);
}
