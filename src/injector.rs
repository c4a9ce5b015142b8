//! The injector: a registry of recipes with an optional parent, responsible
//! for resolving tokens and caching the results.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, trace};

use crate::context::{self, ContextGuard};
use crate::provider::{downcast, Provider, Recipe, Value};
use crate::token::{Constructible, Token};

/// Errors surfaced by resolution and instantiation.
///
/// None of these are retried or recovered internally; they reach the caller
/// of the top-level `get`/`inject`/instantiation synchronously.
#[derive(Error, Debug)]
pub enum InjectError {
    #[error("no provider registered for token `{0}`")]
    TokenNotRegistered(String),
    #[error("`{0}` called outside of any injection scope")]
    InjectionOutsideContext(&'static str),
    #[error("provider for token `{0}` produced a value of an unexpected type")]
    TypeMismatch(String),
}

/// Modifiers narrowing where [Injector::get] may look for a token.
///
/// `self_only` carries the `Self` constraint (never consult the parent) and
/// `skip_self` its complement (never consult the local registry); the two
/// are mutually exclusive by contract, and setting both makes every lookup
/// miss. `host` turns into a `self_only` constraint on the immediate
/// parent's lookup, bounding the search one hop up.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct GetOptions {
    pub optional: bool,
    pub self_only: bool,
    pub skip_self: bool,
    pub host: bool,
}

impl GetOptions {
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn self_only(mut self) -> Self {
        self.self_only = true;
        self
    }

    pub fn skip_self(mut self) -> Self {
        self.skip_self = true;
        self
    }

    pub fn host(mut self) -> Self {
        self.host = true;
        self
    }
}

#[derive(Clone)]
enum ProviderEntry {
    Unresolved(Provider),
    Resolved(Value),
}

static NEXT_INJECTOR_ID: AtomicU64 = AtomicU64::new(0);

static ROOT: Lazy<Arc<Injector>> = Lazy::new(|| Injector::new(None, Vec::new()));

/// The distinguished parentless injector terminating every parent chain.
///
/// Created on first access, alive for the process lifetime.
pub fn root() -> &'static Arc<Injector> {
    &ROOT
}

/// A registry mapping tokens to recipes, with an optional parent consulted
/// on miss.
///
/// A resolved value is cached at the injector holding the recipe, so that
/// injector owns the singleton no matter which descendant asked first.
pub struct Injector {
    id: u64,
    parent: Option<Arc<Injector>>,
    // Injectors only ever live behind an Arc (see `new`); the weak
    // self-reference lets resolution hand out the owning handle.
    weak_self: Weak<Injector>,
    registry: RwLock<HashMap<Token, ProviderEntry>>,
}

impl Injector {
    /// Construct a registry, optionally parented and seeded.
    pub fn new(parent: Option<Arc<Injector>>, recipes: Vec<Recipe>) -> Arc<Injector> {
        let injector = Arc::new_cyclic(|weak| Injector {
            id: NEXT_INJECTOR_ID.fetch_add(1, Ordering::Relaxed),
            parent,
            weak_self: weak.clone(),
            registry: RwLock::new(HashMap::new()),
        });
        for recipe in recipes {
            injector.provide(recipe);
        }
        injector
    }

    /// A new injector parented on this one.
    pub fn child(&self, recipes: Vec<Recipe>) -> Arc<Injector> {
        Injector::new(Some(self.strong_self()), recipes)
    }

    /// The token under which every injector resolves its own identity.
    pub fn token() -> Token {
        Token::of::<Injector>()
    }

    pub fn parent(&self) -> Option<&Arc<Injector>> {
        self.parent.as_ref()
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    fn strong_self(&self) -> Arc<Injector> {
        self.weak_self.upgrade().expect("injector is owned by an Arc")
    }

    /// Register (or overwrite) the recipe for its token.
    pub fn provide(&self, recipe: Recipe) {
        trace!(injector = self.id, token = ?recipe.token, provider = ?recipe.provider, "provide");
        self.registry
            .write()
            .insert(recipe.token, ProviderEntry::Unresolved(recipe.provider));
    }

    /// Register a bare constructible type under its own token.
    pub fn provide_type<T: Constructible>(&self) {
        self.provide(Recipe::class::<T>());
    }

    /// Resolve a value for `token`.
    ///
    /// Returns `Ok(None)` only when the token is unresolvable and
    /// `options.optional` is set; a non-optional miss is
    /// [InjectError::TokenNotRegistered].
    pub fn get(&self, token: &Token, options: GetOptions) -> Result<Option<Value>, InjectError> {
        if !options.skip_self {
            if *token == Injector::token() {
                let own: Value = self.strong_self();
                return Ok(Some(own));
            }
            let entry = self.registry.read().get(token).cloned();
            match entry {
                Some(ProviderEntry::Resolved(value)) => return Ok(Some(value)),
                Some(ProviderEntry::Unresolved(Provider::Value(value))) => {
                    return Ok(Some(self.cache(token, value)));
                }
                Some(ProviderEntry::Unresolved(Provider::Class(ctor))) => {
                    debug!(injector = self.id, token = ?token, "constructing");
                    // The guard drops before the `?` fires, so the ambient
                    // context is restored even when construction fails.
                    let built = {
                        let _scope = ContextGuard::enter(self.strong_self());
                        ctor()
                    }?;
                    return Ok(Some(self.cache(token, built)));
                }
                Some(ProviderEntry::Unresolved(Provider::Factory { factory, deps })) => {
                    // The factory runs inside a fresh injector parented on
                    // the current ambient context, seeded with its deps.
                    let child = Injector::new(Some(context::current()), deps);
                    debug!(injector = self.id, child = child.id, token = ?token, "running factory");
                    let built = {
                        let _scope = ContextGuard::enter(child);
                        factory()
                    }?;
                    return Ok(Some(self.cache(token, built)));
                }
                Some(ProviderEntry::Unresolved(Provider::Existing(target))) => {
                    // Aliases forward the options verbatim and never cache
                    // separately from the recursive call.
                    trace!(injector = self.id, token = ?token, target = ?target, "alias");
                    return self.get(&target, options);
                }
                None => {}
            }
        }
        if !options.self_only {
            if let Some(parent) = &self.parent {
                let delegated = GetOptions {
                    optional: options.optional,
                    self_only: options.host,
                    ..GetOptions::default()
                };
                return parent.get(token, delegated);
            }
        }
        if options.optional {
            Ok(None)
        } else {
            Err(InjectError::TokenNotRegistered(token.label().to_owned()))
        }
    }

    /// Resolve with default options and downcast to the expected type.
    pub fn resolve<T: Any + Send + Sync>(&self, token: &Token) -> Result<Arc<T>, InjectError> {
        match self.get(token, GetOptions::default())? {
            Some(value) => downcast::<T>(token, value),
            None => Err(InjectError::TokenNotRegistered(token.label().to_owned())),
        }
    }

    /// Store the resolved value, keeping the first one if a re-entrant
    /// resolution already cached this token.
    fn cache(&self, token: &Token, value: Value) -> Value {
        let mut registry = self.registry.write();
        match registry.get_mut(token) {
            Some(ProviderEntry::Resolved(existing)) => Arc::clone(existing),
            Some(entry) => {
                trace!(injector = self.id, token = ?token, "cached");
                *entry = ProviderEntry::Resolved(Arc::clone(&value));
                value
            }
            None => {
                registry.insert(token.clone(), ProviderEntry::Resolved(Arc::clone(&value)));
                value
            }
        }
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("id", &self.id)
            .field("entries", &self.registry.read().len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
