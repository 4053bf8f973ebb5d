use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Proof of installing a handler into a [`HookRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookToken(u64);

/// A single shared handler slot for hosts that route engine callbacks
/// through one place.
///
/// Installing replaces whatever was there. Clearing only succeeds for the
/// token of the handler currently installed, so a closing session cannot
/// remove the handler of the session that replaced it.
pub struct HookRegistry<T: ?Sized> {
    slot: Mutex<Option<(HookToken, Arc<T>)>>,
    next: AtomicU64,
}

impl<T: ?Sized> Default for HookRegistry<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
            next: AtomicU64::new(1),
        }
    }
}

impl<T: ?Sized> fmt::Debug for HookRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let installed = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(token, _)| *token);
        f.debug_struct("HookRegistry")
            .field("installed", &installed)
            .finish()
    }
}

impl<T: ?Sized> HookRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, handler: Arc<T>) -> HookToken {
        let token = HookToken(self.next.fetch_add(1, Ordering::SeqCst));
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some((token, handler));
        token
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, handler)| Arc::clone(handler))
    }

    pub fn is_installed(&self, token: HookToken) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|(current, _)| *current == token)
    }

    /// Remove the handler installed with `token`. Returns whether it was still there.
    pub fn clear(&self, token: HookToken) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|(current, _)| *current == token) {
            *slot = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Named(&'static str);

    impl Greeter for Named {
        fn greet(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_stale_clear_keeps_newer_handler() {
        let registry: HookRegistry<dyn Greeter> = HookRegistry::new();
        let first = registry.install(Arc::new(Named("first")));
        let second = registry.install(Arc::new(Named("second")));

        assert!(!registry.clear(first));
        assert_eq!(registry.get().unwrap().greet(), "second");
        assert!(registry.is_installed(second));

        assert!(registry.clear(second));
        assert!(registry.get().is_none());
        assert!(!registry.clear(second));
    }
}
