//! Acquisition registry — resolves routine names to implementations.
//!
//! Data providers reference their routine by file name, possibly with an
//! extension (`modbus_example.py`). The extension is ignored; what remains
//! must be a plain identifier.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cmms_domain::error::AcquisitionError;

use crate::ports::{AcquisitionRoutine, Reading};

/// Name → routine table, built once at startup.
#[derive(Default, Clone)]
pub struct AcquisitionRegistry {
    routines: HashMap<String, Arc<dyn AcquisitionRoutine>>,
}

impl fmt::Debug for AcquisitionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.routines.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AcquisitionRegistry")
            .field("routines", &names)
            .finish()
    }
}

impl AcquisitionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `routine` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, routine: Arc<dyn AcquisitionRoutine>) {
        self.routines.insert(name.into(), routine);
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, routine: Arc<dyn AcquisitionRoutine>) -> Self {
        self.register(name, routine);
        self
    }

    /// Names of every registered routine, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routines.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Find the routine designated by `file_name`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::BadModuleShape`] when the name is not a
    /// plain identifier and [`AcquisitionError::ModuleNotFound`] when nothing
    /// is registered under it.
    pub fn resolve(&self, file_name: &str) -> Result<Arc<dyn AcquisitionRoutine>, AcquisitionError> {
        let name = module_name(file_name)?;
        self.routines
            .get(name)
            .cloned()
            .ok_or_else(|| AcquisitionError::ModuleNotFound(name.to_string()))
    }

    /// Resolve `file_name` and read once from `endpoint`.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve) and
    /// [`AcquisitionRoutine::get_data`].
    pub async fn acquire(
        &self,
        file_name: &str,
        endpoint: &str,
        port: Option<u16>,
    ) -> Result<Reading, AcquisitionError> {
        let routine = self.resolve(file_name)?;
        routine.get_data(endpoint, port).await
    }
}

fn module_name(file_name: &str) -> Result<&str, AcquisitionError> {
    let trimmed = file_name.trim();
    let stem = trimmed
        .rsplit_once('.')
        .map_or(trimmed, |(stem, _extension)| stem);
    let mut chars = stem.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(stem)
    } else {
        Err(AcquisitionError::BadModuleShape(file_name.to_string()))
    }
}
