//! Property-based test generators using proptest.
//!
//! Every generated key is complete and valid: kinds are non-empty, ids are
//! non-zero, names are non-empty and the namespace is uniform along the
//! chain.

use dsent_core::set_namespace;
use dsent_store::{Identifier, Key};
use proptest::prelude::*;

/// Strategy for kind names.
pub fn kind_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-zA-Z]{0,7}").expect("Invalid regex")
}

/// Strategy for namespaces, including the empty default namespace.
pub fn namespace_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        prop::string::string_regex("[a-z][a-z0-9-]{0,11}").expect("Invalid regex"),
    ]
}

/// Strategy for complete identifiers.
pub fn identifier_strategy() -> impl Strategy<Value = Identifier> {
    prop_oneof![
        (1i64..=i64::MAX).prop_map(Identifier::Id),
        (i64::MIN..0i64).prop_map(Identifier::Id),
        prop::string::string_regex("[a-z0-9_]{1,12}")
            .expect("Invalid regex")
            .prop_map(Identifier::Name),
    ]
}

/// Strategy for one `(kind, identifier)` level of a key.
pub fn level_strategy() -> impl Strategy<Value = (String, Identifier)> {
    (kind_strategy(), identifier_strategy())
}

/// Strategy for complete keys with one to `max_depth` levels.
pub fn key_strategy(max_depth: usize) -> impl Strategy<Value = Key> {
    (
        prop::collection::vec(level_strategy(), 1..=max_depth.max(1)),
        namespace_strategy(),
    )
        .prop_map(|(levels, namespace)| build_chain(levels, &namespace))
}

/// Builds a key from root-first levels and stamps `namespace` on every level.
pub fn build_chain(levels: Vec<(String, Identifier)>, namespace: &str) -> Key {
    let mut key: Option<Key> = None;
    for (kind, identifier) in levels {
        key = Some(Key {
            kind,
            identifier,
            namespace: String::new(),
            parent: key.map(Box::new),
        });
    }
    set_namespace(
        key.unwrap_or_else(|| Key::name_key("Root", "root", None)),
        namespace,
    )
}
