//! Stage parameter declarations and expanded values.

use std::collections::BTreeMap;
use std::str::FromStr;

use appendix_shared::{AppendixError, DynamicContext, Result};

/// Documentation for one stage parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamDoc {
    /// Parameter name. A trailing `*` accepts any name with that prefix.
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

impl ParamDoc {
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            required: true,
            description,
        }
    }

    pub const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            required: false,
            description,
        }
    }

    /// Whether a declared parameter name is covered by this entry.
    pub fn accepts(&self, key: &str) -> bool {
        match self.name.strip_suffix('*') {
            Some(prefix) => key.starts_with(prefix) && key.len() > prefix.len(),
            None => key == self.name,
        }
    }
}

/// Parameter values after placeholder expansion for the current item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageParams {
    values: BTreeMap<String, String>,
}

impl StageParams {
    /// Expand every expression in `raw` against `ctx`.
    pub fn expand(raw: &BTreeMap<String, String>, ctx: &DynamicContext) -> Self {
        Self {
            values: raw
                .iter()
                .map(|(k, v)| (k.clone(), ctx.expand(v)))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn required(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| AppendixError::filter(format!("missing parameter '{key}'")))
    }

    /// Parse a value with `FromStr`, falling back to `default` when absent.
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e| {
                AppendixError::filter(format!("invalid value '{raw}' for '{key}': {e}"))
            }),
        }
    }

    /// Parse a boolean flag (`true/false`, `yes/no`, `on/off`, `1/0`).
    pub fn flag(&self, key: &str, default: bool) -> Result<bool> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(AppendixError::filter(format!(
                "invalid boolean '{raw}' for '{key}'"
            ))),
        }
    }

    /// Entries whose name starts with `prefix`, with the prefix stripped.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.values.iter().filter_map(move |(k, v)| {
            k.strip_prefix(prefix)
                .filter(|rest| !rest.is_empty())
                .map(|rest| (rest, v.as_str()))
        })
    }
}

impl<K, V> FromIterator<(K, V)> for StageParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
