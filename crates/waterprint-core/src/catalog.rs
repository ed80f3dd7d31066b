//! Category registry.
//!
//! Maps each water-use category to the most a user can plausibly save in it
//! per day (liters) and a human-facing descriptor. The daily cap bounds every
//! logged challenge action and derives the default challenge target.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Identifier of a water-use category, e.g. `"Shower"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CategoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Catalog entry for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    /// Maximum plausible saving per day, in liters.
    pub daily_cap: f64,
    /// Short label shown to the user.
    pub descriptor: String,
}

impl CategoryInfo {
    pub fn new(daily_cap: f64, descriptor: impl Into<String>) -> Self {
        Self {
            daily_cap,
            descriptor: descriptor.into(),
        }
    }
}

/// Lookup table of registered categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCatalog {
    entries: BTreeMap<CategoryId, CategoryInfo>,
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryCatalog {
    /// An empty catalog.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The reference catalog shipped with the app.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.register("Shower", CategoryInfo::new(5.0, "Shorter showers"));
        catalog.register("Dishwashing", CategoryInfo::new(6.0, "Efficient dishwashing"));
        catalog.register("Laundry", CategoryInfo::new(10.0, "Full laundry loads"));
        catalog.register("Toilet", CategoryInfo::new(4.0, "Fewer and smaller flushes"));
        catalog.register("Tap", CategoryInfo::new(3.0, "Tap off while brushing"));
        catalog.register("Garden", CategoryInfo::new(15.0, "Smarter garden watering"));
        catalog.register("CarWash", CategoryInfo::new(20.0, "Bucket instead of hose"));
        catalog
    }

    /// Merge overrides on top of this catalog, adding unknown categories.
    pub fn with_overrides<I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (CategoryId, CategoryInfo)>,
    {
        for (id, info) in overrides {
            self.entries.insert(id, info);
        }
        self
    }

    pub fn register(&mut self, id: impl Into<CategoryId>, info: CategoryInfo) {
        self.entries.insert(id.into(), info);
    }

    pub fn contains(&self, category: &CategoryId) -> bool {
        self.entries.contains_key(category)
    }

    /// Full entry for a category.
    ///
    /// # Errors
    /// Returns `UnknownCategory` for unregistered identifiers.
    pub fn info(&self, category: &CategoryId) -> Result<&CategoryInfo> {
        self.entries
            .get(category)
            .ok_or_else(|| CoreError::UnknownCategory {
                category: category.clone(),
            })
    }

    /// Maximum saving per day for a category.
    ///
    /// # Errors
    /// Returns `UnknownCategory` for unregistered identifiers.
    pub fn daily_cap(&self, category: &CategoryId) -> Result<f64> {
        Ok(self.info(category)?.daily_cap)
    }

    /// Default challenge target: the daily cap times the duration in days.
    ///
    /// # Errors
    /// Returns `UnknownCategory` for unregistered identifiers.
    pub fn target(&self, category: &CategoryId, duration_days: u32) -> Result<f64> {
        Ok(self.daily_cap(category)? * f64::from(duration_days))
    }

    pub fn descriptor(&self, category: &CategoryId) -> Result<&str> {
        Ok(self.info(category)?.descriptor.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CategoryId, &CategoryInfo)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
