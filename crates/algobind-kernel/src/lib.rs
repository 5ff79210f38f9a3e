//! # Algobind Kernel
//!
//! Turns a server-declared catalogue of remote algorithms into named,
//! callable members of client types without a hand-written wrapper per
//! algorithm.
//!
//! This crate is **transport-agnostic**: it never talks to a server and never
//! executes an algorithm. Catalogue metadata arrives through a
//! [`CatalogSource`]; applied functions are handed to an
//! [`InvocationFactory`].
//!
//! ## Architecture
//!
//! ```text
//! TypeMatcher          ← "is type A acceptable where B is declared"
//!     │
//! Registry             ← name → FunctionHandle, lazily populated, resettable
//!     │
//! FunctionHandle       ← one algorithm: signature, encode, apply
//!     │
//! Binder               ← Prefix.method → instance/static members of a TargetType
//!     │
//! adapter::adapt       ← positional values | named record → NamedArgs
//! ```

pub mod adapter;
pub mod binder;
pub mod error;
pub mod function;
pub mod registry;
pub mod signature;
pub mod target;
pub mod types;
pub mod value;

pub use binder::{BindReport, Binder, BoundEntry, COLLISION_MARKER};
pub use error::{BindError, FetchError, InvocationError, RegistryError};
pub use function::{FunctionHandle, Invocation, InvocationFactory, InvocationRecorder};
pub use registry::{
    CatalogSource, FETCH_DROPPED, FailureCallback, FetchCallback, Registry, SuccessCallback,
};
pub use signature::{ArgSpec, Catalog, Signature, parse_catalog};
pub use target::{BoundMember, Member, MemberKind, TargetType, Trampoline};
pub use types::{OBJECT_TYPE, SubtypeTable, TypeMatcher, strip_generic};
pub use value::{ArgValue, NamedArgs, TYPE_TAG, TypedValue};
