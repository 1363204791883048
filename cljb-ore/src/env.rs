//! Utilities for reading environment variables.

use std::ffi::OsStr;

/// Values of an environment variable we treat as "off".
static FALSEY: &[&str] = &["0", "", "no", "false", "off"];

/// Returns true if the environment variable is set, and is _not_ one of the following:
/// `'0', '', 'no', 'false', 'off'`.
pub fn is_truthy<K: AsRef<OsStr>>(var: K) -> bool {
    let Some(value) = std::env::var_os(var) else {
        return false;
    };
    !is_falsey_value(&value)
}

/// Whether terminal output should include ANSI styling.
///
/// See: <https://no-color.org/>.
pub fn ansi_enabled() -> bool {
    !is_truthy("NO_COLOR")
}

fn is_falsey_value(value: &OsStr) -> bool {
    let value = value.to_ascii_lowercase();
    FALSEY.iter().any(|falsey| value == *falsey)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::is_falsey_value;

    #[test]
    fn falsey_values() {
        for value in ["0", "", "No", "FALSE", "off"] {
            assert!(is_falsey_value(OsStr::new(value)), "{value}");
        }
        for value in ["1", "yes", "true", "anything"] {
            assert!(!is_falsey_value(OsStr::new(value)), "{value}");
        }
    }

    #[test]
    fn unset_is_not_truthy() {
        assert!(!super::is_truthy("CLJB_ORE_DEFINITELY_NOT_SET_ANYWHERE"));
    }
}
