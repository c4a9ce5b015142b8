//! Hierarchical dependency injection with token-keyed registries and an
//! ambient injection context.
//!
//! # Simple use case
//!
//! ```
//! # use std::sync::Arc;
//! # use bonsai::*;
//! struct Config {
//!     greeting: &'static str,
//! }
//!
//! struct Greeter {
//!     config: Arc<Config>,
//! }
//!
//! // A constructible type pulls its dependencies through the ambient
//! // context, by explicit token.
//! impl Constructible for Greeter {
//!     fn construct() -> Result<Self, InjectError> {
//!         Ok(Self {
//!             config: inject_as::<Config>(&Token::of::<Config>())?,
//!         })
//!     }
//! }
//!
//! # fn main() -> Result<(), InjectError> {
//! let injector = Injector::new(None, vec![
//!     Recipe::value(Token::of::<Config>(), Config { greeting: "hello" }),
//! ]);
//! injector.provide_type::<Greeter>();
//!
//! let greeter = injector.resolve::<Greeter>(&Token::of::<Greeter>())?;
//! assert_eq!(greeter.config.greeting, "hello");
//! # Ok(())
//! # }
//! ```
//!
//! # Mechanism
//!
//! Dependencies are identified by [Token]s: either a type's own identity or
//! an explicit labeled identity. An [Injector] maps tokens to [Recipe]s and
//! resolves them lazily, caching each resolved value at the injector that
//! holds the recipe; on a local miss it delegates to its parent, so a chain
//! of injectors forms a tree rooted at the process-wide [root] injector.
//! [GetOptions] narrows a lookup to the local registry (`self_only`), to the
//! ancestry (`skip_self`), or bounds it one hop up (`host`).
//!
//! Code under construction does not hold an injector reference. Instead the
//! thread's *ambient context* points at the injector currently in effect,
//! and [inject]/[inject_as] resolve against it. Every scope-entering
//! construction swaps the pointer in and restores the previous value when it
//! finishes, successfully or not, so nesting forms a well-formed stack.
//!
//! Two construction patterns create scopes:
//!
//! * [Scope::build] constructs a [ScopeBound] type inside a fresh child
//!   injector seeded with the type's own recipes, then registers the
//!   instance there under its own token and under [scope_token];
//! * [instantiate] constructs an [Instantiate] type with explicit arguments
//!   against a caller-supplied injector or the current ambient one, without
//!   registering the result.

mod context;
mod injector;
mod provider;
mod scope;
mod token;

pub use context::{assert_in_context, current, inject, inject_as, set_current, ContextGuard};
pub use injector::{root, GetOptions, InjectError, Injector};
pub use provider::{
    declare_factory, declare_injectable, downcast, ProvidedIn, Provider, ProviderFn, Recipe, Value,
};
pub use scope::{instantiate, scope_token, Instantiate, Scope, ScopeBound};
pub use token::{Constructible, Token};
