//! Projection of catalogue signatures onto target types.
//!
//! `bind(target, prefix, type_name, prepend)` installs one trampoline per
//! catalogue name of the exact shape `<prefix>.<rest>`:
//!
//! 1. The registry is populated first (synchronously if necessary); nothing is
//!    ever bound against a partial catalogue.
//! 2. The member name is `prepend + rest`; the catalogue name is marked bound.
//! 3. The member is an instance member iff the first declared parameter exists,
//!    is not `Object`, and accepts `type_name`. Otherwise it is static. The
//!    decision is made once and baked into the trampoline.
//! 4. Existing members are never overwritten: a taken name gets `_` appended
//!    until a free slot is found.

use crate::adapter;
use crate::error::BindError;
use crate::function::{FunctionHandle, InvocationFactory};
use crate::registry::Registry;
use crate::signature::Signature;
use crate::target::{BoundMember, MemberKind, TargetType, Trampoline};
use crate::types::{OBJECT_TYPE, TypeMatcher};
use crate::value::{ArgValue, TypedValue};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Marker appended to a member name that collides with an existing member.
pub const COLLISION_MARKER: char = '_';

/// One member installed by a bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundEntry {
    pub member: String,
    pub function: String,
    pub kind: MemberKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_from: Option<String>,
}

/// Outcome of one `bind` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindReport {
    pub target: String,
    pub prefix: String,
    pub type_name: String,
    pub members: Vec<BoundEntry>,
}

impl BindReport {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn count(&self, kind: MemberKind) -> usize {
        self.members.iter().filter(|entry| entry.kind == kind).count()
    }
}

/// Installs catalogue-driven members on target types.
pub struct Binder<F> {
    registry: Registry,
    matcher: Arc<dyn TypeMatcher>,
    factory: Arc<F>,
}

impl<F> Clone for Binder<F> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            matcher: Arc::clone(&self.matcher),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<F> std::fmt::Debug for Binder<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<F> Binder<F>
where
    F: InvocationFactory + 'static,
{
    pub fn new(registry: Registry, matcher: impl TypeMatcher + 'static, factory: F) -> Self {
        Self {
            registry,
            matcher: Arc::new(matcher),
            factory: Arc::new(factory),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Instance iff the first parameter is a non-`Object` type accepting
    /// `type_name`.
    pub fn classify(&self, signature: &Signature, type_name: &str) -> MemberKind {
        match signature.first_arg() {
            Some(first)
                if first.type_name != OBJECT_TYPE
                    && self.matcher.accepts(&first.type_name, type_name) =>
            {
                MemberKind::Instance
            }
            _ => MemberKind::Static,
        }
    }

    /// Install every `<prefix>.<rest>` function on `target`.
    pub fn bind(
        &self,
        target: &mut TargetType<F::Output>,
        prefix: &str,
        type_name: &str,
        prepend: Option<&str>,
    ) -> Result<BindReport, BindError> {
        self.registry.populate()?;
        let functions = self.registry.entries()?;
        let prepend = prepend.unwrap_or_default();

        let target_name = target.name().to_string();
        let mut report = BindReport {
            target: target_name.clone(),
            prefix: prefix.to_string(),
            type_name: type_name.to_string(),
            members: Vec::new(),
        };

        for (name, function) in functions {
            let Some(rest) = member_suffix(&name, prefix) else {
                continue;
            };
            self.registry.mark_bound(&name);

            let kind = self.classify(function.signature(), type_name);
            let base = format!("{prepend}{rest}");
            let member = free_member_name(target, kind, &base);
            if member != base {
                debug!(
                    target_type = %target_name,
                    function = %name,
                    requested = %base,
                    installed = %member,
                    "member name taken, renamed"
                );
            }
            if let Some(reason) = &function.signature().deprecated {
                warn!(function = %name, reason = %reason, "binding deprecated algorithm");
            }

            let trampoline = self.trampoline(Arc::clone(&function), kind);
            target.install(BoundMember::new(
                member.clone(),
                target_name.clone(),
                kind,
                function,
                trampoline,
            ));
            report.members.push(BoundEntry {
                renamed_from: (member != base).then_some(base),
                member,
                function: name,
                kind,
            });
        }

        info!(
            target_type = %target_name,
            prefix,
            instance = report.count(MemberKind::Instance),
            statics = report.count(MemberKind::Static),
            "bound catalogue functions"
        );
        Ok(report)
    }

    /// Remove every generated member from `target`, whichever bind installed
    /// it.
    pub fn unbind(&self, target: &mut TargetType<F::Output>) -> usize {
        let removed = target.remove_bound();
        info!(target_type = target.name(), removed, "unbound catalogue functions");
        removed
    }

    fn trampoline(&self, function: Arc<FunctionHandle>, kind: MemberKind) -> Trampoline<F::Output> {
        let factory = Arc::clone(&self.factory);
        Arc::new(
            move |receiver: Option<&TypedValue>,
                  args: Vec<ArgValue>|
                  -> Result<F::Output, BindError> {
                let receiver = match kind {
                    MemberKind::Instance => receiver,
                    MemberKind::Static => None,
                };
                let named = adapter::adapt(function.signature(), receiver, args)?;
                Ok(function.apply(factory.as_ref(), named)?)
            },
        )
    }
}

/// `rest` when `name` is exactly `<prefix>.<rest>` with no further dots.
fn member_suffix<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('.')?;
    (!rest.is_empty() && !rest.contains('.')).then_some(rest)
}

fn free_member_name<O>(target: &TargetType<O>, kind: MemberKind, base: &str) -> String {
    let mut candidate = base.to_string();
    while target.contains(kind, &candidate) {
        candidate.push(COLLISION_MARKER);
    }
    candidate
}
