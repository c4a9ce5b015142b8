//! Token identities for requestable dependencies.
//!
//! A [Token] names a dependency inside an injector's registry. It comes in
//! two flavors:
//!
//! * a *type identity*, obtained with [Token::of], keyed by the type's
//!   [TypeId] so the constructible type acts as its own token;
//! * an *explicit identity*, obtained with [Token::new], keyed by a fresh
//!   value from a process-wide counter.
//!
//! Equality and hashing use the identity key only. The label is carried for
//! diagnostics and may be shared by distinct tokens without conflating them
//! in a registry.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::injector::{root, InjectError};
use crate::provider::{Recipe, Value};

static NEXT_TOKEN_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum TokenKey {
    Type(TypeId),
    Unique(u64),
}

/// Identity of a requestable dependency.
#[derive(Clone)]
pub struct Token {
    key: TokenKey,
    label: Arc<str>,
}

impl Token {
    /// The token identifying a type by its own identity.
    pub fn of<T: Any>() -> Token {
        Token {
            key: TokenKey::Type(TypeId::of::<T>()),
            label: Arc::from(type_name::<T>()),
        }
    }

    /// A fresh explicit token carrying a human-readable label.
    ///
    /// Every call returns a distinct identity, even for an identical label.
    pub fn new(label: impl AsRef<str>) -> Token {
        Token {
            key: TokenKey::Unique(NEXT_TOKEN_ID.fetch_add(1, Ordering::Relaxed)),
            label: Arc::from(label.as_ref()),
        }
    }

    /// A fresh explicit token that eagerly registers a factory for itself
    /// into the [root] injector.
    ///
    /// This is the only token constructor with a side effect beyond identity
    /// creation: the returned token is immediately resolvable from the root,
    /// with `deps` visible to `factory` while it runs.
    pub fn with_root_factory(
        label: impl AsRef<str>,
        factory: impl Fn() -> Result<Value, InjectError> + Send + Sync + 'static,
        deps: Vec<Recipe>,
    ) -> Token {
        let token = Token::new(label);
        root().provide(Recipe::factory(token.clone(), factory, deps));
        token
    }

    /// Diagnostic label. Never used for lookups.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            TokenKey::Type(_) => write!(f, "Token({})", self.label),
            TokenKey::Unique(id) => write!(f, "Token({} #{})", self.label, id),
        }
    }
}

/// A type constructible with no externally supplied arguments.
///
/// Dependencies are pulled through ambient injection inside [construct],
/// typically with [crate::inject_as]. The type acts as its own token via
/// [Token::of].
///
/// [construct]: Constructible::construct
pub trait Constructible: Any + Send + Sync {
    fn construct() -> Result<Self, InjectError>
    where
        Self: Sized;
}
