//! Lazily populated algorithm registry.
//!
//! The registry owns the mapping `name -> FunctionHandle` and the set of names
//! already claimed by a bind. It starts uninitialized and is populated exactly
//! once per reset epoch from a [`CatalogSource`]; population is all-or-nothing.
//!
//! ## Population modes
//!
//! - [`Registry::populate`] fetches synchronously and returns the error.
//! - [`Registry::populate_with`] uses the source's callback fetch. Requests
//!   issued while a fetch is outstanding join it (single-flight) and receive
//!   its outcome.
//!
//! A synchronous populate issued during an outstanding callback fetch does its
//! own fetch and resolves the waiting subscribers; the late callback result is
//! discarded. `reset` fails pending subscribers with [`RegistryError::Reset`].

use crate::error::{BindError, FetchError, RegistryError};
use crate::function::{FunctionHandle, InvocationFactory};
use crate::signature::{Catalog, Signature};
use crate::value::{ArgValue, NamedArgs};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Failure message delivered when a source drops its completion callback.
pub const FETCH_DROPPED: &str = "catalogue fetch dropped";

/// Completion callback handed to [`CatalogSource::fetch_with`].
pub type FetchCallback = Box<dyn FnOnce(Result<Catalog, FetchError>) + Send>;

pub type SuccessCallback = Box<dyn FnOnce() + Send>;
pub type FailureCallback = Box<dyn FnOnce(RegistryError) + Send>;

/// Where algorithm metadata comes from.
pub trait CatalogSource: Send + Sync {
    /// Fetch the whole catalogue, blocking until it is available.
    fn fetch(&self) -> Result<Catalog, FetchError>;

    /// Fetch and deliver the result through `done`, possibly later and on
    /// another thread. Defaults to calling [`CatalogSource::fetch`] inline.
    fn fetch_with(&self, done: FetchCallback) {
        done(self.fetch());
    }
}

struct Subscriber {
    on_success: SuccessCallback,
    on_failure: Option<FailureCallback>,
}

enum Population {
    Uninitialized,
    Pending {
        fetch_id: u64,
        subscribers: Vec<Subscriber>,
    },
    Populated(BTreeMap<String, Arc<FunctionHandle>>),
}

impl Population {
    fn is_populated(&self) -> bool {
        matches!(self, Population::Populated(_))
    }

    fn into_subscribers(self) -> Vec<Subscriber> {
        match self {
            Population::Pending { subscribers, .. } => subscribers,
            _ => Vec::new(),
        }
    }
}

struct RegistryState {
    population: Population,
    bound: BTreeSet<String>,
    next_fetch_id: u64,
}

/// Shared handle to one algorithm registry. Clones share state.
#[derive(Clone)]
pub struct Registry {
    source: Arc<dyn CatalogSource>,
    state: Arc<Mutex<RegistryState>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        let population = match &state.population {
            Population::Uninitialized => "uninitialized".to_string(),
            Population::Pending { subscribers, .. } => {
                format!("pending ({} subscribers)", subscribers.len())
            }
            Population::Populated(functions) => format!("populated ({})", functions.len()),
        };
        f.debug_struct("Registry")
            .field("population", &population)
            .field("bound", &state.bound.len())
            .finish()
    }
}

impl Registry {
    pub fn new(source: impl CatalogSource + 'static) -> Self {
        Self::from_source(Arc::new(source))
    }

    pub fn from_source(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(RegistryState {
                population: Population::Uninitialized,
                bound: BTreeSet::new(),
                next_fetch_id: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_populated(&self) -> bool {
        self.lock().population.is_populated()
    }

    /// Populate synchronously. No-op when already populated.
    pub fn populate(&self) -> Result<(), RegistryError> {
        if self.is_populated() {
            return Ok(());
        }
        info!("fetching algorithm catalogue");
        let catalog = match self.source.fetch() {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(error = %err, "algorithm catalogue fetch failed");
                return Err(err.into());
            }
        };

        let waiting = {
            let mut state = self.lock();
            if state.population.is_populated() {
                return Ok(());
            }
            let functions = build_functions(catalog);
            info!(functions = functions.len(), "algorithm registry populated");
            mem::replace(&mut state.population, Population::Populated(functions))
                .into_subscribers()
        };
        if !waiting.is_empty() {
            debug!(
                subscribers = waiting.len(),
                "resolving pending subscribers after synchronous population"
            );
        }
        notify(waiting, Ok(()));
        Ok(())
    }

    /// Populate through the source's callback fetch.
    ///
    /// When already populated `on_success` runs immediately. Without an
    /// `on_failure` callback a failure is logged.
    pub fn populate_with(
        &self,
        on_success: impl FnOnce() + Send + 'static,
        on_failure: Option<FailureCallback>,
    ) {
        let subscriber = Subscriber {
            on_success: Box::new(on_success),
            on_failure,
        };

        let fetch_id = {
            let mut state = self.lock();
            if state.population.is_populated() {
                drop(state);
                (subscriber.on_success)();
                return;
            }
            if let Population::Pending { subscribers, .. } = &mut state.population {
                debug!("joining outstanding catalogue fetch");
                subscribers.push(subscriber);
                return;
            }
            state.next_fetch_id += 1;
            let fetch_id = state.next_fetch_id;
            state.population = Population::Pending {
                fetch_id,
                subscribers: vec![subscriber],
            };
            fetch_id
        };

        info!(fetch_id, "fetching algorithm catalogue in the background");
        let completion = FetchCompletion {
            registry: Some(self.clone()),
            fetch_id,
        };
        self.source.fetch_with(Box::new(move |result: Result<Catalog, FetchError>| {
            completion.complete(result)
        }));
    }

    fn complete_fetch(&self, fetch_id: u64, result: Result<Catalog, FetchError>) {
        let (subscribers, outcome) = {
            let mut state = self.lock();
            let current = matches!(
                &state.population,
                Population::Pending { fetch_id: pending, .. } if *pending == fetch_id
            );
            if !current {
                debug!(fetch_id, "discarding stale catalogue fetch");
                return;
            }
            let subscribers =
                mem::replace(&mut state.population, Population::Uninitialized).into_subscribers();
            let outcome = match result {
                Ok(catalog) => {
                    let functions = build_functions(catalog);
                    info!(functions = functions.len(), "algorithm registry populated");
                    state.population = Population::Populated(functions);
                    Ok(())
                }
                Err(err) => {
                    warn!(error = %err, "algorithm catalogue fetch failed");
                    Err(RegistryError::from(err))
                }
            };
            (subscribers, outcome)
        };
        notify(subscribers, outcome);
    }

    /// Clear the mapping and the bound-name set.
    ///
    /// Members already installed on target types keep the handles they
    /// captured and stay callable.
    pub fn reset(&self) {
        let abandoned = {
            let mut state = self.lock();
            state.bound.clear();
            mem::replace(&mut state.population, Population::Uninitialized).into_subscribers()
        };
        info!("algorithm registry reset");
        notify(abandoned, Err(RegistryError::Reset));
    }

    fn with_functions<T>(
        &self,
        read: impl FnOnce(&BTreeMap<String, Arc<FunctionHandle>>, &BTreeSet<String>) -> T,
    ) -> Result<T, RegistryError> {
        self.populate()?;
        let state = self.lock();
        match &state.population {
            Population::Populated(functions) => Ok(read(functions, &state.bound)),
            _ => Err(RegistryError::Reset),
        }
    }

    /// The handle registered under `name`. Unknown names are fatal.
    pub fn lookup(&self, name: &str) -> Result<Arc<FunctionHandle>, RegistryError> {
        self.lookup_optional(name)?
            .ok_or_else(|| RegistryError::UnknownFunction(name.to_string()))
    }

    /// Like [`Registry::lookup`] but unknown names yield `None`.
    pub fn lookup_optional(&self, name: &str) -> Result<Option<Arc<FunctionHandle>>, RegistryError> {
        self.with_functions(|functions, _| functions.get(name).cloned())
    }

    pub fn all_signatures(&self) -> Result<BTreeMap<String, Signature>, RegistryError> {
        self.with_functions(|functions, _| {
            functions
                .iter()
                .map(|(name, function)| (name.clone(), function.signature().clone()))
                .collect()
        })
    }

    /// Every registered handle.
    pub fn entries(&self) -> Result<BTreeMap<String, Arc<FunctionHandle>>, RegistryError> {
        self.with_functions(|functions, _| functions.clone())
    }

    /// Handles whose names no bind has claimed yet.
    pub fn unbound_entries(&self) -> Result<BTreeMap<String, Arc<FunctionHandle>>, RegistryError> {
        self.with_functions(|functions, bound| {
            functions
                .iter()
                .filter(|(name, _)| !bound.contains(*name))
                .map(|(name, function)| (name.clone(), Arc::clone(function)))
                .collect()
        })
    }

    pub fn bound_names(&self) -> BTreeSet<String> {
        self.lock().bound.clone()
    }

    pub(crate) fn mark_bound(&self, name: &str) {
        self.lock().bound.insert(name.to_string());
    }

    pub fn len(&self) -> Result<usize, RegistryError> {
        self.with_functions(|functions, _| functions.len())
    }

    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        self.len().map(|len| len == 0)
    }

    /// Apply the algorithm `name` to a named-argument record.
    pub fn apply<F>(&self, factory: &F, name: &str, args: NamedArgs) -> Result<F::Output, BindError>
    where
        F: InvocationFactory + ?Sized,
    {
        Ok(self.lookup(name)?.apply(factory, args)?)
    }

    /// Call the algorithm `name` with positional values.
    pub fn call<F>(
        &self,
        factory: &F,
        name: &str,
        values: Vec<ArgValue>,
    ) -> Result<F::Output, BindError>
    where
        F: InvocationFactory + ?Sized,
    {
        Ok(self.lookup(name)?.call(factory, values)?)
    }
}

/// Completes a callback fetch exactly once. A callback dropped without being
/// called fails the fetch, so the registry stays retryable.
struct FetchCompletion {
    registry: Option<Registry>,
    fetch_id: u64,
}

impl FetchCompletion {
    fn complete(mut self, result: Result<Catalog, FetchError>) {
        if let Some(registry) = self.registry.take() {
            registry.complete_fetch(self.fetch_id, result);
        }
    }
}

impl Drop for FetchCompletion {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.take() {
            warn!(fetch_id = self.fetch_id, "catalogue fetch callback dropped uncalled");
            registry.complete_fetch(self.fetch_id, Err(FetchError::new(FETCH_DROPPED)));
        }
    }
}

fn build_functions(catalog: Catalog) -> BTreeMap<String, Arc<FunctionHandle>> {
    catalog
        .into_iter()
        .map(|(name, signature)| {
            let function = FunctionHandle::new(name.clone(), &signature.normalized());
            (name, Arc::new(function))
        })
        .collect()
}

fn notify(subscribers: Vec<Subscriber>, outcome: Result<(), RegistryError>) {
    for subscriber in subscribers {
        match &outcome {
            Ok(()) => (subscriber.on_success)(),
            Err(err) => match subscriber.on_failure {
                Some(on_failure) => on_failure(err.clone()),
                None => warn!(error = %err, "catalogue population failed with no failure callback"),
            },
        }
    }
}
