//! Calling-convention normalization for bound members.
//!
//! A bound member accepts either a single named record or an ordered list of
//! positional values. Both are reduced here to the canonical [`NamedArgs`]
//! record consumed by [`FunctionHandle::apply`](crate::FunctionHandle::apply).
//!
//! - **Named record**: exactly one argument and it is an
//!   [`ArgValue::Record`]. For instance members the receiver is injected under
//!   the first declared parameter; the record may not already define it.
//! - **Positional**: anything else. The receiver (instance members only) is
//!   prepended and values are paired with parameters in declared order.
//!   Values beyond the declared list have no name to travel under and are
//!   rejected.

use crate::error::InvocationError;
use crate::signature::Signature;
use crate::value::{ArgValue, NamedArgs, TypedValue};

/// Reduce call-time arguments to the canonical named record.
pub fn adapt(
    signature: &Signature,
    receiver: Option<&TypedValue>,
    args: Vec<ArgValue>,
) -> Result<NamedArgs, InvocationError> {
    match single_record(args) {
        Ok(record) => bind_named(signature, receiver, record),
        Err(values) => {
            let values = receiver
                .map(|receiver| ArgValue::Typed(receiver.clone()))
                .into_iter()
                .chain(values)
                .collect();
            pair_positional(signature, values)
        }
    }
}

/// Pair values with declared parameters in order.
pub fn pair_positional(
    signature: &Signature,
    values: Vec<ArgValue>,
) -> Result<NamedArgs, InvocationError> {
    if values.len() > signature.args.len() {
        return Err(InvocationError::TooManyArguments {
            function: signature.name.clone(),
            expected: signature.args.len(),
            actual: values.len(),
        });
    }
    Ok(signature
        .args
        .iter()
        .zip(values)
        .map(|(spec, value)| (spec.name.clone(), value))
        .collect())
}

fn single_record(mut args: Vec<ArgValue>) -> Result<NamedArgs, Vec<ArgValue>> {
    if args.len() == 1
        && args[0].is_record()
        && let Some(ArgValue::Record(record)) = args.pop()
    {
        return Ok(record);
    }
    Err(args)
}

fn bind_named(
    signature: &Signature,
    receiver: Option<&TypedValue>,
    mut record: NamedArgs,
) -> Result<NamedArgs, InvocationError> {
    let Some(receiver) = receiver else {
        return Ok(record);
    };
    let Some(first) = signature.first_arg() else {
        return Err(InvocationError::TooManyArguments {
            function: signature.name.clone(),
            expected: 0,
            actual: 1,
        });
    };
    if record.contains_key(&first.name) {
        return Err(InvocationError::ArgumentCollision {
            function: signature.name.clone(),
            argument: first.name.clone(),
        });
    }
    record.insert(first.name.clone(), ArgValue::Typed(receiver.clone()));
    Ok(record)
}
