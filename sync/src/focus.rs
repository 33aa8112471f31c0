//! Shared focus-mode toggle.
//!
//! The provider owns the flag; handles only borrow it weakly, so reading or
//! writing through a handle after its provider is gone is an error rather
//! than a silent default.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FocusModeError {
    #[error("focus mode used outside of its provider")]
    OutsideProvider,
}

/// Owner of the focus-mode flag. Defaults to off.
#[derive(Debug, Default)]
pub struct FocusModeProvider {
    enabled: Arc<AtomicBool>,
}

impl FocusModeProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn handle(&self) -> FocusModeHandle {
        FocusModeHandle {
            enabled: Arc::downgrade(&self.enabled),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

#[derive(Debug, Clone)]
pub struct FocusModeHandle {
    enabled: Weak<AtomicBool>,
}

impl FocusModeHandle {
    fn flag(&self) -> Result<Arc<AtomicBool>, FocusModeError> {
        self.enabled.upgrade().ok_or(FocusModeError::OutsideProvider)
    }

    pub fn is_enabled(&self) -> Result<bool, FocusModeError> {
        Ok(self.flag()?.load(Ordering::Acquire))
    }

    pub fn set(&self, enabled: bool) -> Result<(), FocusModeError> {
        self.flag()?.store(enabled, Ordering::Release);
        Ok(())
    }

    /// Returns the new value.
    pub fn toggle(&self) -> Result<bool, FocusModeError> {
        Ok(!self.flag()?.fetch_xor(true, Ordering::AcqRel))
    }
}
