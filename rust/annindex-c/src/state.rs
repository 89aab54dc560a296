//! Lifecycle of an index handle.
//!
//! `Uninitialized -> Initialized -> Cleared`, with `Cleared` terminal. The
//! engine lives inside the `Initialized` variant, so it exists exactly when
//! the handle is initialized.

use crate::error::HandleError;
use crate::types::AnnIndexState;

#[derive(Debug)]
pub enum Lifecycle<E> {
    Uninitialized,
    Initialized(E),
    Cleared,
}

impl<E> Default for Lifecycle<E> {
    fn default() -> Self {
        Lifecycle::Uninitialized
    }
}

impl<E> Lifecycle<E> {
    pub fn state(&self) -> AnnIndexState {
        match self {
            Lifecycle::Uninitialized => AnnIndexState::AnnIndexState_Uninitialized,
            Lifecycle::Initialized(_) => AnnIndexState::AnnIndexState_Initialized,
            Lifecycle::Cleared => AnnIndexState::AnnIndexState_Cleared,
        }
    }

    pub fn is_cleared(&self) -> bool {
        matches!(self, Lifecycle::Cleared)
    }

    /// Fail with `AlreadyCleared` once the handle is cleared.
    pub fn ensure_live(&self) -> Result<(), HandleError> {
        if self.is_cleared() {
            Err(HandleError::AlreadyCleared)
        } else {
            Ok(())
        }
    }

    /// The engine, if initialized. The cleared check comes first.
    pub fn engine(&self) -> Result<&E, HandleError> {
        match self {
            Lifecycle::Cleared => Err(HandleError::AlreadyCleared),
            Lifecycle::Uninitialized => Err(HandleError::NotInitialized),
            Lifecycle::Initialized(engine) => Ok(engine),
        }
    }

    pub fn engine_mut(&mut self) -> Result<&mut E, HandleError> {
        match self {
            Lifecycle::Cleared => Err(HandleError::AlreadyCleared),
            Lifecycle::Uninitialized => Err(HandleError::NotInitialized),
            Lifecycle::Initialized(engine) => Ok(engine),
        }
    }

    /// Move from `Uninitialized` to `Initialized` with the engine built by `build`.
    ///
    /// `build` only runs when the transition is allowed; if it fails the
    /// handle stays uninitialized.
    pub fn initialize<F>(&mut self, build: F) -> Result<(), HandleError>
    where
        F: FnOnce() -> Result<E, HandleError>,
    {
        match self {
            Lifecycle::Cleared => Err(HandleError::AlreadyCleared),
            Lifecycle::Initialized(_) => Err(HandleError::AlreadyInitialized),
            Lifecycle::Uninitialized => {
                *self = Lifecycle::Initialized(build()?);
                Ok(())
            }
        }
    }

    /// Install `engine`, returning the engine it replaces, if any.
    pub fn replace(&mut self, engine: E) -> Result<Option<E>, HandleError> {
        self.ensure_live()?;
        match std::mem::replace(self, Lifecycle::Initialized(engine)) {
            Lifecycle::Initialized(previous) => Ok(Some(previous)),
            _ => Ok(None),
        }
    }

    /// Move to `Cleared`, handing back the engine so the caller can drop it.
    pub fn clear(&mut self) -> Result<Option<E>, HandleError> {
        self.ensure_live()?;
        match std::mem::replace(self, Lifecycle::Cleared) {
            Lifecycle::Initialized(engine) => Ok(Some(engine)),
            _ => Ok(None),
        }
    }
}
