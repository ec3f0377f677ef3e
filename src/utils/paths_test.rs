use crate::utils::paths::base_name;
use crate::utils::paths::parent_path;

#[test]
fn parent_of_top_level_node_is_root() {
    assert_eq!(parent_path("/a"), "/");
}

#[test]
fn parent_of_nested_node_drops_last_segment() {
    assert_eq!(parent_path("/a/b"), "/a");
    assert_eq!(parent_path("/a/b/c"), "/a/b");
}

#[test]
fn parent_of_root_is_root() {
    assert_eq!(parent_path("/"), "/");
}

#[test]
fn base_name_returns_last_segment() {
    assert_eq!(base_name("/a"), "a");
    assert_eq!(base_name("/a/b"), "b");
    assert_eq!(base_name("/a/s0000000000"), "s0000000000");
}

#[test]
fn base_name_of_root_is_empty() {
    assert_eq!(base_name("/"), "");
}

#[test]
fn slashless_path_is_its_own_parent() {
    assert_eq!(parent_path("a"), "a");
    assert_eq!(base_name("a"), "a");
}

#[test]
fn trailing_slash_yields_empty_base_name() {
    assert_eq!(parent_path("/a/"), "/a");
    assert_eq!(base_name("/a/"), "");
}
