//! Scope-creating construction: each built instance gets its own child
//! injector, active as the ambient context only while the instance's
//! constructor runs.

use std::any::Any;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::context::{self, ContextGuard};
use crate::injector::{InjectError, Injector};
use crate::provider::{Recipe, Value};
use crate::token::Token;

static SCOPE_TOKEN: Lazy<Token> = Lazy::new(|| Token::new("CurrentScope"));

/// The well-known marker token under which a finished scope registers its
/// instance, so nested code can ambient-inject "the enclosing scope's
/// instance" without naming its type.
pub fn scope_token() -> Token {
    SCOPE_TOKEN.clone()
}

/// A type whose construction opens a child injector seeded with its own
/// recipes.
pub trait ScopeBound: Any + Send + Sync {
    /// Recipes visible only to this instance and its descendants.
    fn local_recipes() -> Vec<Recipe>
    where
        Self: Sized,
    {
        Vec::new()
    }

    fn construct() -> Result<Self, InjectError>
    where
        Self: Sized;
}

/// A constructed instance together with the child injector created for it.
///
/// The injector stays alive as long as the scope (or any descendant holding
/// it) does.
pub struct Scope<T> {
    instance: Arc<T>,
    injector: Arc<Injector>,
}

impl<T: ScopeBound> Scope<T> {
    /// Build an instance of `T` inside a fresh scope.
    ///
    /// The child injector is parented on the current ambient context,
    /// seeded with [ScopeBound::local_recipes], and made ambient while
    /// [ScopeBound::construct] runs; the prior context is restored on every
    /// exit path. The finished instance is registered into the child under
    /// `T`'s own token and under [scope_token].
    pub fn build() -> Result<Scope<T>, InjectError> {
        let parent = context::current();
        let injector = Injector::new(Some(parent), T::local_recipes());
        debug!(injector = injector.id(), type_name = std::any::type_name::<T>(), "building scope");
        let instance = {
            let _scope = ContextGuard::enter(Arc::clone(&injector));
            T::construct()
        }?;
        let instance = Arc::new(instance);
        let shared: Value = instance.clone();
        injector.provide(Recipe::shared(Token::of::<T>(), Arc::clone(&shared)));
        injector.provide(Recipe::shared(scope_token(), shared));
        Ok(Scope { instance, injector })
    }
}

impl<T> std::fmt::Debug for Scope<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("type", &std::any::type_name::<T>())
            .field("injector", &self.injector.id())
            .finish()
    }
}

impl<T> Scope<T> {
    pub fn instance(&self) -> &Arc<T> {
        &self.instance
    }

    pub fn injector(&self) -> &Arc<Injector> {
        &self.injector
    }
}

/// A type constructible on demand with explicit arguments, outside the
/// declarative scope-binding path.
pub trait Instantiate: Sized {
    type Args;

    fn instantiate(args: Self::Args) -> Result<Self, InjectError>;
}

/// Build an instance of `T` against `injector`, or against the injector
/// obtained by ambient-injecting [Injector::token] when none is given (which
/// requires some scope to have been entered on this thread).
///
/// The injector is made ambient while the constructor runs and the prior
/// context is restored on every exit path. The result is not registered
/// anywhere.
pub fn instantiate<T: Instantiate>(
    args: T::Args,
    injector: Option<Arc<Injector>>,
) -> Result<T, InjectError> {
    let injector = match injector {
        Some(injector) => injector,
        None => {
            context::assert_in_context("instantiate")?;
            context::inject_as::<Injector>(&Injector::token())?
        }
    };
    let _scope = ContextGuard::enter(injector);
    T::instantiate(args)
}
