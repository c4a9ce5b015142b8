//! Recipes describing how to produce a value for a token.
//!
//! A [Recipe] pairs a [Token] with a [Provider]:
//!
//! * [Provider::Value] holds an already-constructed value, returned as-is.
//! * [Provider::Class] instantiates a [Constructible] type; the constructor
//!   pulls its own dependencies through the ambient context.
//! * [Provider::Factory] runs a function inside a fresh child injector
//!   seeded with the declared dependency recipes.
//! * [Provider::Existing] forwards resolution to another token.
//!
//! Registering a bare constructible type is sugar for a class recipe keyed
//! by the type's own token, see [Recipe::class].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::injector::{root, InjectError};
use crate::token::{Constructible, Token};

/// The currency of resolution: a shared, dynamically typed value.
pub type Value = Arc<dyn Any + Send + Sync>;

/// A stored constructor or factory function.
pub type ProviderFn = Arc<dyn Fn() -> Result<Value, InjectError> + Send + Sync>;

/// How to produce a value for a token.
#[derive(Clone)]
pub enum Provider {
    Value(Value),
    Class(ProviderFn),
    Factory { factory: ProviderFn, deps: Vec<Recipe> },
    Existing(Token),
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Value(_) => f.write_str("Value"),
            Provider::Class(_) => f.write_str("Class"),
            Provider::Factory { deps, .. } => write!(f, "Factory({} deps)", deps.len()),
            Provider::Existing(target) => write!(f, "Existing({:?})", target),
        }
    }
}

/// A registrable resolution rule: a token plus the provider producing it.
#[derive(Clone, Debug)]
pub struct Recipe {
    pub token: Token,
    pub provider: Provider,
}

impl Recipe {
    /// An already-constructed value for `token`.
    pub fn value<V: Any + Send + Sync>(token: Token, value: V) -> Recipe {
        Recipe {
            token,
            provider: Provider::Value(Arc::new(value)),
        }
    }

    /// An already-shared value for `token`.
    pub fn shared(token: Token, value: Value) -> Recipe {
        Recipe {
            token,
            provider: Provider::Value(value),
        }
    }

    /// The constructor shorthand: `T` provided under its own token.
    pub fn class<T: Constructible>() -> Recipe {
        Recipe::class_as::<T>(Token::of::<T>())
    }

    /// `T` provided under an explicit token.
    pub fn class_as<T: Constructible>(token: Token) -> Recipe {
        Recipe {
            token,
            provider: Provider::Class(Arc::new(|| {
                let built: Value = Arc::new(T::construct()?);
                Ok(built)
            })),
        }
    }

    /// A factory for `token`, with `deps` visible only while it runs.
    pub fn factory(
        token: Token,
        factory: impl Fn() -> Result<Value, InjectError> + Send + Sync + 'static,
        deps: Vec<Recipe>,
    ) -> Recipe {
        Recipe {
            token,
            provider: Provider::Factory {
                factory: Arc::new(factory),
                deps,
            },
        }
    }

    /// An alias: resolving `token` is exactly equivalent to resolving
    /// `target` with the same options.
    pub fn existing(token: Token, target: Token) -> Recipe {
        Recipe {
            token,
            provider: Provider::Existing(target),
        }
    }
}

/// Recover the concrete type behind a resolved [Value].
pub fn downcast<T: Any + Send + Sync>(token: &Token, value: Value) -> Result<Arc<T>, InjectError> {
    value
        .downcast()
        .map_err(|_| InjectError::TypeMismatch(token.label().to_owned()))
}

/// Where a declared type registers itself during bootstrap.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ProvidedIn {
    /// Registered nowhere; the type must be provided explicitly.
    #[default]
    Nowhere,
    /// Registered into the [root] injector.
    Root,
}

/// Declarative registration hook for a constructible type.
///
/// Called once during bootstrap rather than as a side effect of type
/// definition. A no-op unless `provided_in` is [ProvidedIn::Root].
pub fn declare_injectable<T: Constructible>(provided_in: ProvidedIn) {
    if provided_in == ProvidedIn::Root {
        root().provide(Recipe::class::<T>());
    }
}

/// Declarative registration hook for a token backed by a factory.
///
/// A no-op unless `provided_in` is [ProvidedIn::Root].
pub fn declare_factory(
    provided_in: ProvidedIn,
    token: Token,
    factory: impl Fn() -> Result<Value, InjectError> + Send + Sync + 'static,
    deps: Vec<Recipe>,
) {
    if provided_in == ProvidedIn::Root {
        root().provide(Recipe::factory(token, factory, deps));
    }
}
