//! Binding tables for client types.
//!
//! A [`TargetType`] is the explicit stand-in for a client class: two member
//! tables, one for the instance surface (called with a receiver) and one for
//! the static surface. Members are hand-written methods, constants, or
//! trampolines installed by the [`Binder`](crate::Binder).

use crate::error::BindError;
use crate::function::FunctionHandle;
use crate::signature::Signature;
use crate::value::{ArgValue, TypedValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Which surface of a target a member lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Instance,
    Static,
}

impl MemberKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Instance => "instance",
            MemberKind::Static => "static",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callable body shared by native and bound members. Receives the receiver
/// for instance calls.
pub type Trampoline<O> =
    Arc<dyn Fn(Option<&TypedValue>, Vec<ArgValue>) -> Result<O, BindError> + Send + Sync>;

/// A member generated from a catalogue signature.
pub struct BoundMember<O> {
    name: String,
    target: String,
    kind: MemberKind,
    function: Arc<FunctionHandle>,
    trampoline: Trampoline<O>,
}

impl<O> BoundMember<O> {
    pub(crate) fn new(
        name: String,
        target: String,
        kind: MemberKind,
        function: Arc<FunctionHandle>,
        trampoline: Trampoline<O>,
    ) -> Self {
        Self {
            name,
            target,
            kind,
            function,
            trampoline,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn function(&self) -> &Arc<FunctionHandle> {
        &self.function
    }

    /// The originating signature, kept for introspection.
    pub fn signature(&self) -> &Signature {
        self.function.signature()
    }

    pub fn doc(&self) -> String {
        self.function.doc()
    }
}

/// Canonical call form: `Image::load(id) -> Image` for static members,
/// `Image::add(self, image2) -> Image` for instance members. Optional
/// parameters are bracketed.
impl<O> fmt::Display for BoundMember<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signature = self.signature();
        let skip = usize::from(self.kind == MemberKind::Instance);
        let receiver = (self.kind == MemberKind::Instance).then_some("self".to_string());
        let params = receiver
            .into_iter()
            .chain(signature.args.iter().skip(skip).map(|arg| {
                if arg.required {
                    arg.name.clone()
                } else {
                    format!("[{}]", arg.name)
                }
            }))
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "{}::{}({}) -> {}",
            self.target, self.name, params, signature.returns
        )
    }
}

impl<O> fmt::Debug for BoundMember<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMember")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("function", &self.function.name())
            .finish()
    }
}

/// One entry in a target's member table.
pub enum Member<O> {
    /// Hand-written method.
    Native(Trampoline<O>),
    /// Non-callable value.
    Constant(Value),
    /// Trampoline generated from a catalogue signature.
    Bound(BoundMember<O>),
}

impl<O> Member<O> {
    pub fn is_callable(&self) -> bool {
        !matches!(self, Member::Constant(_))
    }

    /// Attached signature, present only on generated members.
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Member::Bound(bound) => Some(bound.signature()),
            _ => None,
        }
    }

    pub fn as_bound(&self) -> Option<&BoundMember<O>> {
        match self {
            Member::Bound(bound) => Some(bound),
            _ => None,
        }
    }
}

impl<O> fmt::Debug for Member<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Native(_) => f.write_str("Native"),
            Member::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Member::Bound(bound) => fmt::Debug::fmt(bound, f),
        }
    }
}

/// Member tables of one client type.
pub struct TargetType<O> {
    name: String,
    instance: BTreeMap<String, Member<O>>,
    statics: BTreeMap<String, Member<O>>,
}

impl<O> fmt::Debug for TargetType<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetType")
            .field("name", &self.name)
            .field("instance", &self.instance.keys().collect::<Vec<_>>())
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<O> TargetType<O> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance: BTreeMap::new(),
            statics: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surface(&self, kind: MemberKind) -> &BTreeMap<String, Member<O>> {
        match kind {
            MemberKind::Instance => &self.instance,
            MemberKind::Static => &self.statics,
        }
    }

    fn surface_mut(&mut self, kind: MemberKind) -> &mut BTreeMap<String, Member<O>> {
        match kind {
            MemberKind::Instance => &mut self.instance,
            MemberKind::Static => &mut self.statics,
        }
    }

    pub fn member(&self, kind: MemberKind, name: &str) -> Option<&Member<O>> {
        self.surface(kind).get(name)
    }

    pub fn contains(&self, kind: MemberKind, name: &str) -> bool {
        self.surface(kind).contains_key(name)
    }

    /// Define a hand-written method. Replaces any member of the same name.
    pub fn define_native<F>(&mut self, kind: MemberKind, name: impl Into<String>, body: F)
    where
        F: Fn(Option<&TypedValue>, Vec<ArgValue>) -> Result<O, BindError> + Send + Sync + 'static,
    {
        self.surface_mut(kind)
            .insert(name.into(), Member::Native(Arc::new(body)));
    }

    /// Define a non-callable static value.
    pub fn define_constant(&mut self, name: impl Into<String>, value: Value) {
        self.statics.insert(name.into(), Member::Constant(value));
    }

    pub(crate) fn install(&mut self, member: BoundMember<O>) {
        let kind = member.kind;
        self.surface_mut(kind)
            .insert(member.name.clone(), Member::Bound(member));
    }

    /// Every generated member on both surfaces, instance surface first.
    pub fn bound_members(&self) -> impl Iterator<Item = &BoundMember<O>> {
        self.instance
            .values()
            .chain(self.statics.values())
            .filter_map(Member::as_bound)
    }

    /// Remove every callable member carrying a signature. Returns the number
    /// removed.
    pub fn remove_bound(&mut self) -> usize {
        let before = self.instance.len() + self.statics.len();
        let keep = |_: &String, member: &mut Member<O>| {
            !(member.is_callable() && member.signature().is_some())
        };
        self.instance.retain(keep);
        self.statics.retain(keep);
        before - (self.instance.len() + self.statics.len())
    }

    /// Call a static member.
    pub fn call_static(&self, name: &str, args: Vec<ArgValue>) -> Result<O, BindError> {
        self.invoke(MemberKind::Static, name, None, args)
    }

    /// Call an instance member on `receiver`.
    pub fn call_method(
        &self,
        receiver: &TypedValue,
        name: &str,
        args: Vec<ArgValue>,
    ) -> Result<O, BindError> {
        self.invoke(MemberKind::Instance, name, Some(receiver), args)
    }

    fn invoke(
        &self,
        kind: MemberKind,
        name: &str,
        receiver: Option<&TypedValue>,
        args: Vec<ArgValue>,
    ) -> Result<O, BindError> {
        let member = self
            .member(kind, name)
            .ok_or_else(|| BindError::NoSuchMember {
                target: self.name.clone(),
                member: name.to_string(),
            })?;
        match member {
            Member::Native(body) => body(receiver, args),
            Member::Bound(bound) => (bound.trampoline)(receiver, args),
            Member::Constant(_) => Err(BindError::NotCallable {
                target: self.name.clone(),
                member: name.to_string(),
            }),
        }
    }
}
