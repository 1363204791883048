//! Configuration flags for `cljb` itself.
//!
//! Flags are declared as `static` [`Config`]s next to the code that reads them, registered once
//! into a [`ConfigSetBuilder`], and then shared as a [`ConfigSet`]. Overrides arrive as
//! `name=value` strings, e.g. from `--config build_dir=out` on the command line.
//!
//! The types in this crate should _not_ be used for the dependency configurations of a project,
//! those live in `cljb-graph`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use cljb_ore::assert_none;
use compact_str::CompactString;

/// A named flag with a default of type `V`.
pub struct Config<V: FlagValue> {
    name: &'static str,
    desc: &'static str,
    default: V,
}

impl<V: FlagValue> Config<V> {
    pub const fn new(name: &'static str, desc: &'static str, default: V) -> Self {
        Config {
            name,
            desc,
            default,
        }
    }

    /// Name this [`Config`] is registered and overridden with.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current value of this flag in `set`.
    ///
    /// # Panics
    ///
    /// * If the flag was never registered into `set`.
    pub fn read(&self, set: &ConfigSet) -> V::Owned {
        let flag = set.slot(self.name).current();
        match V::decode(&flag) {
            Some(value) => value,
            None => panic!("config '{}' holds {flag:?}", self.name),
        }
    }
}

/// Every registered flag, cheap to clone. Clones observe each other's updates.
#[derive(Clone, Debug)]
pub struct ConfigSet {
    slots: Arc<BTreeMap<&'static str, Slot>>,
}

impl ConfigSet {
    pub fn builder() -> ConfigSetBuilder {
        ConfigSetBuilder::default()
    }

    fn slot(&self, name: &str) -> &Slot {
        match self.slots.get(name) {
            Some(slot) => slot,
            None => panic!("config '{name}' was never registered"),
        }
    }

    /// Set the flag called `name` from its textual form.
    pub fn try_update(&self, name: &str, value: &str) -> Result<(), anyhow::Error> {
        let Some(slot) = self.slots.get(name) else {
            anyhow::bail!("no config named '{name}', run `cljb configs` to list them");
        };
        let flag = slot.current().parse_same_kind(value)?;
        slot.replace(flag);
        Ok(())
    }

    /// Apply an override of the form `name=value`.
    pub fn apply_override(&self, raw: &str) -> Result<(), anyhow::Error> {
        let Some((name, value)) = raw.split_once('=') else {
            anyhow::bail!("expected an override of the form 'name=value', got '{raw}'");
        };
        self.try_update(name.trim(), value.trim())
    }
}

impl fmt::Display for ConfigSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, slot) in self.slots.iter() {
            writeln!(f, "{name} = {}", slot.current())?;
            writeln!(f, "    {}", slot.desc)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Slot {
    desc: &'static str,
    current: RwLock<Flag>,
}

impl Slot {
    fn current(&self) -> Flag {
        self.current.read().expect("config lock poisoned").clone()
    }

    fn replace(&self, flag: Flag) {
        let mut current = self.current.write().expect("config lock poisoned");
        assert_eq!(
            std::mem::discriminant(&*current),
            std::mem::discriminant(&flag),
            "config changed kind",
        );
        *current = flag;
    }
}

/// Collects [`Config`]s before they're frozen into a [`ConfigSet`].
#[derive(Default, Debug)]
pub struct ConfigSetBuilder {
    slots: BTreeMap<&'static str, Slot>,
}

impl ConfigSetBuilder {
    /// Register `config` with its default value.
    ///
    /// # Panics
    ///
    /// * If a config with the same name is already registered.
    pub fn register<V: FlagValue>(&mut self, config: &'static Config<V>) -> &mut Self {
        let slot = Slot {
            desc: config.desc,
            current: RwLock::new(config.default.encode()),
        };
        let prev = self.slots.insert(config.name, slot);
        assert_none!(prev, "config '{}' registered more than once", config.name);
        self
    }

    pub fn build(self) -> ConfigSet {
        ConfigSet {
            slots: Arc::new(self.slots),
        }
    }
}

/// Value of a single flag, whatever its Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flag {
    Bool(bool),
    Text(CompactString),
}

impl Flag {
    /// Parse `raw` into a [`Flag`] of the same kind as `self`.
    fn parse_same_kind(&self, raw: &str) -> Result<Flag, anyhow::Error> {
        let flag = match self {
            Flag::Bool(_) => match raw {
                "true" | "1" | "yes" | "on" => Flag::Bool(true),
                "false" | "0" | "no" | "off" => Flag::Bool(false),
                other => anyhow::bail!("expected a boolean, got '{other}'"),
            },
            Flag::Text(_) => Flag::Text(CompactString::new(raw)),
        };
        Ok(flag)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Bool(value) => write!(f, "{value}"),
            Flag::Text(value) => write!(f, "'{value}'"),
        }
    }
}

/// Rust types a [`Config`] can hold.
pub trait FlagValue {
    /// What [`Config::read`] hands back.
    type Owned;

    fn encode(&self) -> Flag;
    fn decode(flag: &Flag) -> Option<Self::Owned>;
}

impl FlagValue for bool {
    type Owned = bool;

    fn encode(&self) -> Flag {
        Flag::Bool(*self)
    }

    fn decode(flag: &Flag) -> Option<bool> {
        match flag {
            Flag::Bool(value) => Some(*value),
            Flag::Text(_) => None,
        }
    }
}

impl FlagValue for &str {
    type Owned = CompactString;

    fn encode(&self) -> Flag {
        Flag::Text(CompactString::new(self))
    }

    fn decode(flag: &Flag) -> Option<CompactString> {
        match flag {
            Flag::Text(value) => Some(value.clone()),
            Flag::Bool(_) => None,
        }
    }
}
