//! Utilities for `assert!`s.

/// Asserts that the provided expression, that returns an `Option`, is `None`.
///
/// Used after inserting into a map that should never have held the key.
#[macro_export]
macro_rules! assert_none {
    ($val:expr, $($msg:tt)+) => {{
        if let Some(y) = &$val {
            panic!("assertion failed: expected None found Some({y:?}), {}", format!($($msg)+));
        }
    }};
    ($val:expr) => {{
        if let Some(y) = &$val {
            panic!("assertion failed: expected None found Some({y:?})");
        }
    }}
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    #[test]
    fn none_passes() {
        let mut map = BTreeMap::new();
        let prev = map.insert("compileClojure", 1);
        assert_none!(prev, "task {} registered twice", "compileClojure");
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn some_panics() {
        let mut map = BTreeMap::new();
        map.insert("compileClojure", 1);
        let prev = map.insert("compileClojure", 2);
        assert_none!(prev, "task {} registered twice", "compileClojure");
    }
}
