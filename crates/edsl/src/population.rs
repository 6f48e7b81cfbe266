//! Populating containers from mappings
//!
//! `populate_with` writes every key of a mapping whose `{key}=` writer
//! exists on the container, in the mapping's order. When the mapping holds
//! a nested mapping under the container's populate key (its type name in
//! snake case, `LoginPage` -> `login_page`), that nested mapping is used
//! instead. Keys without a writer are skipped.

use crate::container::Container;
use crate::result::EdslResult;
use crate::value::{Options, Value};
use tracing::{debug, trace};

impl Container {
    /// Write every matching key of `data`
    pub fn populate_with(&self, data: &Options) -> EdslResult<()> {
        let key = self.populate_key();
        let data = match data.get(&key) {
            Some(Value::Map(nested)) => {
                trace!(container = self.type_name(), populate_key = %key, "using nested data");
                nested
            }
            _ => data,
        };

        for (field, value) in data.iter() {
            if self.has_writer(field) {
                trace!(container = self.type_name(), field, "populating");
                let _ = self.dispatch(&format!("{field}="), &[value.clone()])?;
            } else {
                debug!(container = self.type_name(), field, "no writer, skipping");
            }
        }
        Ok(())
    }

    /// Key under which population data for this container may be nested
    #[must_use]
    pub fn populate_key(&self) -> String {
        snake_case(self.type_name())
    }
}

/// `LoginPage` -> `login_page`, `HTTPServer` -> `http_server`,
/// `Admin::UserForm` -> `admin/user_form`.
#[must_use]
pub fn snake_case(name: &str) -> String {
    let name = name.replace("::", "/");
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' {
            out.push('_');
            continue;
        }
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = prev.is_some_and(|p| {
                p.is_lowercase()
                    || p.is_ascii_digit()
                    || (p.is_uppercase() && next.is_some_and(char::is_lowercase))
            });
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
