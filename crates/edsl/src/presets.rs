//! Named accessor presets
//!
//! A preset is a reusable [`AccessorOptions`] default stored under a name
//! such as `text_field`. Declaring `text_field("username", {id: "u"})`
//! merges the declaration's options over the preset (shallow, override
//! wins) and validates the result into an [`AccessorSpec`].
//!
//! [`PresetRegistry::standard`] carries the stock element presets:
//!
//! | presets                              | read      | write |
//! |--------------------------------------|-----------|-------|
//! | [`TEXT_ELEMENTS`]                    | `text`    |       |
//! | [`CLICKABLE_ELEMENTS`]               | `click`   |       |
//! | [`CONTENT_EDITABLE_ELEMENTS`]        | `value`   | `set` |
//! | [`SETTABLE_ELEMENTS`]                | `set?`    | `set` |
//!
//! Each stock preset locates its element by dispatching its own name on
//! the driver.

use crate::accessor_spec::{AccessorOptions, AccessorSpec};
use crate::result::{EdslError, EdslResult};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Tags whose read returns their text
pub const TEXT_ELEMENTS: &[&str] = &[
    "abbr", "address", "article", "aside", "b", "blockquote", "caption", "cite", "code", "dd",
    "del", "details", "dfn", "div", "dl", "dt", "element", "em", "fieldset", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "i", "image",
    "img", "ins", "kbd", "label", "legend", "li", "main", "mark", "nav", "ol", "option", "p",
    "pre", "q", "s", "samp", "small", "span", "strong", "sub", "summary", "sup", "table",
    "tbody", "td", "tfoot", "th", "thead", "time", "tr", "u", "ul", "var",
];

/// Tags whose read clicks them
pub const CLICKABLE_ELEMENTS: &[&str] = &["button", "a", "link"];

/// Tags read with `value` and written with `set`
pub const CONTENT_EDITABLE_ELEMENTS: &[&str] = &["text_field", "textarea", "text_area"];

/// Tags read with `set?` and written with `set`
pub const SETTABLE_ELEMENTS: &[&str] = &["radio", "checkbox"];

/// Registry of named presets.
///
/// Aliases share the stored options with the preset they alias.
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    presets: HashMap<String, Arc<AccessorOptions>>,
}

impl PresetRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the stock element presets
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for tag in TEXT_ELEMENTS {
            registry.define_preset(*tag, AccessorOptions::new().how(*tag).default_method("text"));
        }
        for tag in CLICKABLE_ELEMENTS {
            registry.define_preset(*tag, AccessorOptions::new().how(*tag).default_method("click"));
        }
        for tag in CONTENT_EDITABLE_ELEMENTS {
            registry.define_preset(
                *tag,
                AccessorOptions::new()
                    .how(*tag)
                    .default_method("value")
                    .assign_method("set"),
            );
        }
        for tag in SETTABLE_ELEMENTS {
            registry.define_preset(
                *tag,
                AccessorOptions::new()
                    .how(*tag)
                    .default_method("set?")
                    .assign_method("set"),
            );
        }
        registry
    }

    /// Process-wide read-only copy of [`PresetRegistry::standard`]
    #[must_use]
    pub fn shared_standard() -> Arc<Self> {
        static STANDARD: OnceLock<Arc<PresetRegistry>> = OnceLock::new();
        Arc::clone(STANDARD.get_or_init(|| Arc::new(Self::standard())))
    }

    /// Register (or replace) a preset
    pub fn define_preset(&mut self, name: impl Into<String>, defaults: AccessorOptions) {
        let name = name.into();
        debug!(preset = %name, "defining preset");
        let _ = self.presets.insert(name, Arc::new(defaults));
    }

    /// Builder-style [`PresetRegistry::define_preset`]
    #[must_use]
    pub fn with_preset(mut self, name: impl Into<String>, defaults: AccessorOptions) -> Self {
        self.define_preset(name, defaults);
        self
    }

    /// Register several presets at once
    pub fn define_presets<I, N>(&mut self, presets: I)
    where
        I: IntoIterator<Item = (N, AccessorOptions)>,
        N: Into<String>,
    {
        for (name, defaults) in presets {
            self.define_preset(name, defaults);
        }
    }

    /// Make `new_name` a synonym of `existing`
    pub fn alias_preset(
        &mut self,
        new_name: impl Into<String>,
        existing: &str,
    ) -> EdslResult<()> {
        let defaults = self.lookup(existing)?;
        let new_name = new_name.into();
        debug!(preset = %new_name, alias_of = existing, "aliasing preset");
        let _ = self.presets.insert(new_name, defaults);
        Ok(())
    }

    /// Stored defaults for `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AccessorOptions> {
        self.presets.get(name).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    /// Registered preset names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.presets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Expand `preset` into a spec for accessor `name`, with `overrides`
    /// merged over the preset defaults.
    pub fn expand(
        &self,
        preset: &str,
        name: &str,
        overrides: &AccessorOptions,
    ) -> EdslResult<AccessorSpec> {
        let defaults = self.lookup(preset)?;
        debug!(preset, accessor = name, "expanding preset");
        defaults.merged(overrides).into_spec(name)
    }

    fn lookup(&self, name: &str) -> EdslResult<Arc<AccessorOptions>> {
        self.presets
            .get(name)
            .cloned()
            .ok_or_else(|| EdslError::UnknownPreset {
                name: name.to_string(),
            })
    }
}
