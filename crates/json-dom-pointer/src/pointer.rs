//! The [`Pointer`] value type.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::util::{decode_path, encode_path, split_relative_prefix};
use crate::validate::validate_parameters;
use crate::PointerError;

/// An absolute or relative pointer.
///
/// An absolute pointer is a root-relative sequence of path components. A
/// relative pointer carries a count of ancestor levels to climb from a
/// context node, followed either by a suffix path or by a key lookup (`#`),
/// which addresses the key of the node reached rather than the node.
///
/// Text forms:
///
/// | Text       | Levels | Path           | Key lookup |
/// |------------|--------|----------------|------------|
/// | `""`       | -      | `[]`           | no         |
/// | `/a/0`     | -      | `["a", "0"]`   | no         |
/// | `0`        | 0      | `[]`           | no         |
/// | `2/foo/0`  | 2      | `["foo", "0"]` | no         |
/// | `1#`       | 1      | `[]`           | yes        |
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pointer {
    path: Vec<String>,
    relative_levels: Option<usize>,
    key_lookup: bool,
}

impl Pointer {
    /// Parse pointer text.
    ///
    /// # Example
    ///
    /// ```
    /// use json_dom_pointer::Pointer;
    ///
    /// let p = Pointer::parse("2/foo/0").unwrap();
    /// assert_eq!(p.relative_levels(), Some(2));
    /// assert_eq!(p.path(), ["foo", "0"]);
    ///
    /// assert!(Pointer::parse("1#").unwrap().is_key_lookup());
    /// assert!(Pointer::parse("foo").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, PointerError> {
        let (relative_levels, rest) = split_relative_prefix(text)?;

        if relative_levels.is_some() && rest == "#" {
            return Ok(Self {
                path: Vec::new(),
                relative_levels,
                key_lookup: true,
            });
        }

        Ok(Self {
            path: decode_path(rest)?,
            relative_levels,
            key_lookup: false,
        })
    }

    /// Build a pointer from its parts, validating the combination.
    ///
    /// # Example
    ///
    /// ```
    /// use json_dom_pointer::Pointer;
    ///
    /// let p = Pointer::from_parameters(["a/b~c"], None, false).unwrap();
    /// assert_eq!(p.to_string(), "/a~1b~0c");
    ///
    /// assert!(Pointer::from_parameters(Vec::<String>::new(), Some(-1), false).is_err());
    /// ```
    pub fn from_parameters<I, S>(
        path: I,
        relative_levels: Option<i64>,
        key_lookup: bool,
    ) -> Result<Self, PointerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path: Vec<String> = path.into_iter().map(Into::into).collect();
        validate_parameters(&path, relative_levels, key_lookup)?;

        let relative_levels = relative_levels
            .map(|levels| usize::try_from(levels).map_err(|_| PointerError::InvalidRelativeLevels))
            .transpose()?;

        Ok(Self {
            path,
            relative_levels,
            key_lookup,
        })
    }

    /// An absolute pointer over the given components.
    pub fn absolute<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            relative_levels: None,
            key_lookup: false,
        }
    }

    /// A relative pointer climbing `levels` ancestors, then following `path`.
    pub fn relative<I, S>(levels: usize, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            relative_levels: Some(levels),
            key_lookup: false,
        }
    }

    /// A relative key lookup (`<levels>#`).
    pub fn key_lookup(levels: usize) -> Self {
        Self {
            path: Vec::new(),
            relative_levels: Some(levels),
            key_lookup: true,
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn relative_levels(&self) -> Option<usize> {
        self.relative_levels
    }

    pub fn is_relative(&self) -> bool {
        self.relative_levels.is_some()
    }

    pub fn is_key_lookup(&self) -> bool {
        self.key_lookup
    }

    /// Pointer to a descendant reached by appending `keys` to the path.
    ///
    /// Any key-lookup marker is cleared.
    ///
    /// # Example
    ///
    /// ```
    /// use json_dom_pointer::Pointer;
    ///
    /// let p = Pointer::parse("/a").unwrap().pointer_for_child(["b", "0"]);
    /// assert_eq!(p.to_string(), "/a/b/0");
    ///
    /// let p = Pointer::parse("1#").unwrap().pointer_for_child(["x"]);
    /// assert_eq!(p.to_string(), "1/x");
    /// ```
    pub fn pointer_for_child<I, S>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut result = self.clone();
        result.key_lookup = false;
        result.path.extend(keys.into_iter().map(Into::into));
        result
    }

    /// Pointer to the ancestor `levels` steps up.
    ///
    /// Components are stripped from the end of the path; once the path is
    /// exhausted the remaining levels are added to the relative prefix.
    ///
    /// # Errors
    ///
    /// - `levels` is zero
    /// - an absolute pointer is asked to go above its root
    ///
    /// # Example
    ///
    /// ```
    /// use json_dom_pointer::Pointer;
    ///
    /// let p = Pointer::parse("1/a/b").unwrap();
    /// assert_eq!(p.pointer_for_ancestor(1).unwrap().to_string(), "1/a");
    /// assert_eq!(p.pointer_for_ancestor(4).unwrap().to_string(), "3");
    ///
    /// assert!(Pointer::parse("/a").unwrap().pointer_for_ancestor(2).is_err());
    /// ```
    pub fn pointer_for_ancestor(&self, levels: usize) -> Result<Self, PointerError> {
        if levels < 1 {
            return Err(PointerError::NonPositiveAncestorLevels);
        }
        self.resolve_ancestor(levels)
    }

    /// Resolve `other` using `self` as the base location.
    ///
    /// An absolute `other` is returned unchanged. A relative `other` is
    /// folded into the frame of `self`: the ancestor of `self` at
    /// `other`'s level, followed by `other`'s path. The key-lookup marker
    /// of `other` carries over.
    ///
    /// ```text
    /// base:   /a/b/c      other: 1/d/e   result: /a/b/d/e
    /// base:   3/a/b/c     other: 4/d/e   result: 2/d/e
    /// ```
    ///
    /// # Errors
    ///
    /// - the ancestor lies above the root of an absolute base
    /// - a key lookup would land on a non-empty path or an absolute pointer,
    ///   neither of which can express a key lookup
    pub fn resolve_pointer(&self, other: &Pointer) -> Result<Self, PointerError> {
        let Some(levels) = other.relative_levels else {
            return Ok(other.clone());
        };

        let mut result = self.resolve_ancestor(levels)?;
        result.path.extend(other.path.iter().cloned());
        result.key_lookup = other.key_lookup;

        if result.key_lookup {
            let levels = result
                .relative_levels
                .map(|l| i64::try_from(l).unwrap_or(i64::MAX));
            validate_parameters(&result.path, levels, true)?;
        }

        Ok(result)
    }

    fn resolve_ancestor(&self, levels: usize) -> Result<Self, PointerError> {
        let mut result = self.clone();
        if levels == 0 {
            return Ok(result);
        }

        match self.path.len().checked_sub(levels) {
            Some(remaining) => result.path.truncate(remaining),
            None => {
                let deficit = levels - self.path.len();
                let current = self
                    .relative_levels
                    .ok_or(PointerError::AncestorAboveRoot)?;
                result.relative_levels = Some(
                    current
                        .checked_add(deficit)
                        .ok_or(PointerError::InvalidRelativeLevels)?,
                );
                result.path.clear();
            }
        }

        Ok(result)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        if let Some(levels) = self.relative_levels {
            out.push_str(&levels.to_string());
        }
        if self.key_lookup {
            out.push('#');
        } else {
            encode_path(&self.path, &mut out);
        }
        f.write_str(&out)
    }
}

impl FromStr for Pointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Pointer {
    type Error = PointerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Serialize for Pointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(de::Error::custom)
    }
}
