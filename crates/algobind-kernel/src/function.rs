//! Function handles and the invocation factory seam.
//!
//! A [`FunctionHandle`] stands for one remote algorithm. It never executes
//! anything: applying it hands the canonical named-argument record to an
//! [`InvocationFactory`], which builds whatever represents "the result of
//! calling this algorithm" (an expression node, a recorded request, ...).

use crate::adapter;
use crate::error::{InvocationError, RegistryError};
use crate::registry::Registry;
use crate::signature::Signature;
use crate::value::{ArgValue, NamedArgs};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Builds the result object for an applied function.
pub trait InvocationFactory: Send + Sync {
    type Output;

    /// `function.encode()` is the token identifying the callee; `args` is the
    /// canonical named-argument record.
    fn invoke(
        &self,
        function: &FunctionHandle,
        args: NamedArgs,
    ) -> Result<Self::Output, InvocationError>;
}

/// One remote algorithm with its immutable signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionHandle {
    signature: Signature,
}

impl FunctionHandle {
    /// Copies `signature` and stamps `name` onto the copy.
    pub fn new(name: impl Into<String>, signature: &Signature) -> Self {
        let mut signature = signature.clone();
        signature.name = name.into();
        Self { signature }
    }

    /// The handle already registered under `name`.
    pub fn lookup(registry: &Registry, name: &str) -> Result<Arc<FunctionHandle>, RegistryError> {
        registry.lookup(name)
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Wire token for this function: the bare algorithm name.
    pub fn encode(&self) -> &str {
        &self.signature.name
    }

    /// Apply to a named-argument record. No value checking happens here.
    pub fn apply<F>(&self, factory: &F, args: NamedArgs) -> Result<F::Output, InvocationError>
    where
        F: InvocationFactory + ?Sized,
    {
        factory.invoke(self, args)
    }

    /// Pair positional values with the declared parameters, then apply.
    pub fn call<F>(&self, factory: &F, values: Vec<ArgValue>) -> Result<F::Output, InvocationError>
    where
        F: InvocationFactory + ?Sized,
    {
        let args = adapter::pair_positional(&self.signature, values)?;
        self.apply(factory, args)
    }

    pub fn doc(&self) -> String {
        self.signature.doc()
    }
}

impl fmt::Display for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .signature
            .args
            .iter()
            .map(|arg| arg.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}({})", self.name(), params)
    }
}

impl Serialize for FunctionHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.encode())
    }
}

/// A recorded call: callee token plus canonical arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    pub function: String,
    pub arguments: NamedArgs,
}

/// Factory producing [`Invocation`] records.
///
/// Checks argument names against the signature: unknown names and missing
/// required parameters (without a declared default) are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationRecorder;

impl InvocationFactory for InvocationRecorder {
    type Output = Invocation;

    fn invoke(
        &self,
        function: &FunctionHandle,
        args: NamedArgs,
    ) -> Result<Invocation, InvocationError> {
        let signature = function.signature();
        if let Some(unknown) = args.keys().find(|key| signature.arg(key).is_none()) {
            return Err(InvocationError::UnknownArgument {
                function: function.name().to_string(),
                argument: unknown.clone(),
            });
        }
        if let Some(missing) = signature
            .args
            .iter()
            .find(|arg| arg.required && arg.default.is_none() && !args.contains_key(&arg.name))
        {
            return Err(InvocationError::MissingArgument {
                function: function.name().to_string(),
                argument: missing.name.clone(),
            });
        }
        Ok(Invocation {
            function: function.encode().to_string(),
            arguments: args,
        })
    }
}
