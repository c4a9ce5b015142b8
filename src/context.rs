//! The ambient injection context: a thread-local pointer to the injector
//! currently in effect.
//!
//! Code under construction calls [inject] or [inject_as] without holding an
//! injector reference; the pointer is swapped around every scope-entering
//! construction in a strict push/restore discipline. [ContextGuard] is the
//! scoped form of that discipline: it restores the previous pointer on every
//! exit path, including panics and early returns on error.
//!
//! The pointer is per-thread, so resolution on independent threads never
//! interleaves scope stacks.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use crate::injector::{root, GetOptions, InjectError, Injector};
use crate::provider::Value;
use crate::token::Token;

thread_local! {
    static CURRENT: RefCell<Option<Arc<Injector>>> = RefCell::new(None);
    // Sticky: once a scope has been entered on this thread, ambient
    // operations are considered in-context even after full restoration.
    static ENTERED: Cell<bool> = Cell::new(false);
}

/// The injector currently in effect, defaulting to [root] when none is set.
///
/// The "no injector" state normalizes to root on read, never on write, so
/// nested scopes restore correctly back to the true default.
pub fn current() -> Arc<Injector> {
    CURRENT
        .with(|slot| slot.borrow().clone())
        .unwrap_or_else(|| Arc::clone(root()))
}

/// Replace the ambient pointer, returning the previous value.
///
/// Passing `None` clears the pointer rather than storing root.
pub fn set_current(injector: Option<Arc<Injector>>) -> Option<Arc<Injector>> {
    if injector.is_some() {
        ENTERED.with(|flag| flag.set(true));
    }
    CURRENT.with(|slot| slot.replace(injector))
}

/// Fail with [InjectError::InjectionOutsideContext] unless some scope has
/// been entered on this thread.
pub fn assert_in_context(operation: &'static str) -> Result<(), InjectError> {
    if ENTERED.with(Cell::get) {
        Ok(())
    } else {
        Err(InjectError::InjectionOutsideContext(operation))
    }
}

/// Resolve `token` against the current ambient injector.
pub fn inject(token: &Token, options: GetOptions) -> Result<Option<Value>, InjectError> {
    current().get(token, options)
}

/// Resolve `token` against the current ambient injector and downcast.
pub fn inject_as<T: Any + Send + Sync>(token: &Token) -> Result<Arc<T>, InjectError> {
    current().resolve(token)
}

/// Scoped entry into an injector: the previous ambient pointer is restored
/// when the guard drops.
pub struct ContextGuard {
    previous: Option<Arc<Injector>>,
    // The guard manipulates thread-local state and must not cross threads.
    _not_send: PhantomData<*const ()>,
}

impl ContextGuard {
    pub fn enter(injector: Arc<Injector>) -> ContextGuard {
        trace!(injector = injector.id(), "entering scope");
        ContextGuard {
            previous: set_current(Some(injector)),
            _not_send: PhantomData,
        }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        trace!("restoring scope");
        set_current(self.previous.take());
    }
}
