//! Preview session: detect a preview from the page address, load the draft
//! document, and expose the outcome as [`SessionState`].
//!
//! One session per page mount. The load chain (fetch, type paths,
//! materialize, resolve) runs at most once per distinct fingerprint. A
//! spawned chain holds only a weak handle and the generation it started
//! under, so results that land after the session was dropped or reset are
//! discarded.

mod error;
mod state;

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::case::camel_case;
use crate::error::PreviewError;
use crate::fetch::{fetch_preview_document, ContentApiConnector};
use crate::fingerprint::PreviewFingerprint;
use crate::node::{materialize_document, NodeMaterializer};
use crate::registry::{ConfigError, ConfigRegistry, EffectiveConfig, PreviewOptions};
use crate::resolver::resolve_path;
use crate::type_paths::TypePathsSource;

pub use error::SessionError;
pub use state::{reduce, Loaded, PreviewData, SessionAction, SessionPhase, SessionState};

/// The collaborators a session loads through.
#[derive(Clone)]
pub struct PreviewDeps {
    pub connector: Arc<dyn ContentApiConnector>,
    pub type_paths: Arc<dyn TypePathsSource>,
    pub materializer: Arc<dyn NodeMaterializer>,
}

impl PreviewDeps {
    pub fn new(
        connector: Arc<dyn ContentApiConnector>,
        type_paths: Arc<dyn TypePathsSource>,
        materializer: Arc<dyn NodeMaterializer>,
    ) -> Self {
        PreviewDeps {
            connector,
            type_paths,
            materializer,
        }
    }

    /// The stock stack: reqwest content API, type paths served from
    /// `type_paths_base_url`, and the default materializer.
    #[cfg(feature = "http")]
    pub fn http(type_paths_base_url: &str) -> Result<Self, crate::fetch::FetchError> {
        Ok(PreviewDeps::new(
            Arc::new(crate::fetch::HttpConnector::new()),
            Arc::new(crate::type_paths::HttpTypePathsLoader::new(type_paths_base_url)?),
            Arc::new(crate::node::DocumentMaterializer::new()),
        ))
    }
}

type FingerprintKey = Option<(String, String)>;

struct Machine {
    state: SessionState,
    /// `None` until something was observed.
    observed: Option<FingerprintKey>,
    generation: u64,
    history: Vec<SessionPhase>,
}

/// A load the caller has to run.
struct Job {
    generation: u64,
    token: String,
    document_id: String,
}

struct SessionInner {
    config: EffectiveConfig,
    deps: PreviewDeps,
    machine: Mutex<Machine>,
    updates: watch::Sender<SessionState>,
}

impl SessionInner {
    fn lock(&self, operation: &'static str) -> Result<MutexGuard<'_, Machine>, SessionError> {
        self.machine
            .lock()
            .map_err(|_| SessionError::LockPoisoned(operation))
    }

    fn dispatch(&self, machine: &mut Machine, action: SessionAction) -> Result<(), SessionError> {
        let name = action.name();
        let next = reduce(&machine.state, action)?;
        let from = machine.state.phase();
        let to = next.phase();
        if from != to {
            machine.history.push(to);
        }
        debug!(
            repository = %self.config.repository_name,
            action = name,
            %from,
            %to,
            "preview session transition"
        );
        machine.state = next.clone();
        self.updates.send_replace(next);
        Ok(())
    }

    /// Record `fingerprint` and move to not-preview or loading. Returns the
    /// load to run, if any.
    fn begin(
        &self,
        machine: &mut Machine,
        fingerprint: &PreviewFingerprint,
    ) -> Result<Option<Job>, SessionError> {
        let key: FingerprintKey = fingerprint
            .pair()
            .map(|(token, id)| (token.to_string(), id.to_string()));

        if machine.state.phase() != SessionPhase::Undetermined {
            self.dispatch(machine, SessionAction::Reset)?;
        }
        machine.generation += 1;
        machine.observed = Some(key.clone());

        match key {
            None => {
                self.dispatch(machine, SessionAction::IsNotPreview)?;
                Ok(None)
            }
            Some((token, document_id)) => {
                self.dispatch(machine, SessionAction::IsPreview)?;
                Ok(Some(Job {
                    generation: machine.generation,
                    token,
                    document_id,
                }))
            }
        }
    }

    fn complete(
        &self,
        generation: u64,
        outcome: Result<Loaded, PreviewError>,
    ) -> Result<(), SessionError> {
        let mut machine = self.lock("complete")?;
        if machine.generation != generation {
            debug!(
                generation,
                current = machine.generation,
                "discarding stale preview load"
            );
            return Ok(());
        }

        let action = match outcome {
            Ok(loaded) => SessionAction::DocumentLoaded(Some(loaded)),
            Err(err) => {
                warn!(
                    repository = %self.config.repository_name,
                    error = %err,
                    "preview load failed, continuing without preview"
                );
                SessionAction::DocumentLoaded(None)
            }
        };
        self.dispatch(&mut machine, action)
    }
}

fn same_fingerprint(machine: &Machine, fingerprint: &PreviewFingerprint) -> bool {
    let key = fingerprint
        .pair()
        .map(|(token, id)| (token.to_string(), id.to_string()));
    machine.observed.as_ref() == Some(&key)
}

pub struct PreviewSession {
    inner: Arc<SessionInner>,
}

impl PreviewSession {
    /// Build a session for `options.repository_name`, overlaid on what the
    /// build step published in `registry`.
    pub fn new<R>(
        options: PreviewOptions,
        registry: &R,
        deps: PreviewDeps,
    ) -> Result<Self, ConfigError>
    where
        R: ConfigRegistry + ?Sized,
    {
        let config = EffectiveConfig::resolve(options, registry)?;
        Ok(Self::with_config(config, deps))
    }

    pub fn with_config(config: EffectiveConfig, deps: PreviewDeps) -> Self {
        let (updates, _) = watch::channel(SessionState::default());
        PreviewSession {
            inner: Arc::new(SessionInner {
                config,
                deps,
                machine: Mutex::new(Machine {
                    state: SessionState::default(),
                    observed: None,
                    generation: 0,
                    history: vec![SessionPhase::Undetermined],
                }),
                updates,
            }),
        }
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.inner.config
    }

    /// Detect synchronously and spawn the load on the current tokio runtime.
    ///
    /// Returns the state right after detection: not-preview, or loading.
    /// Observing the fingerprint already in effect changes nothing.
    pub fn observe(&self, fingerprint: &PreviewFingerprint) -> Result<SessionState, SessionError> {
        let runtime = Handle::try_current().ok();
        let job = {
            let mut machine = self.inner.lock("observe")?;
            if same_fingerprint(&machine, fingerprint) {
                return Ok(machine.state.clone());
            }
            if fingerprint.is_valid() && runtime.is_none() {
                return Err(SessionError::NoRuntime);
            }
            self.inner.begin(&mut machine, fingerprint)?
        };

        if let (Some(job), Some(runtime)) = (job, runtime) {
            let weak: Weak<SessionInner> = Arc::downgrade(&self.inner);
            let config = self.inner.config.clone();
            let deps = self.inner.deps.clone();
            runtime.spawn(async move {
                let outcome = load(&config, &deps, &job.token, &job.document_id).await;
                match weak.upgrade() {
                    Some(inner) => {
                        if let Err(err) = inner.complete(job.generation, outcome) {
                            warn!(error = %err, "could not apply preview load");
                        }
                    }
                    None => debug!("preview session dropped before load finished"),
                }
            });
        }

        Ok(self.state())
    }

    /// Detect and drive the load inline; returns the settled state.
    pub async fn run(&self, fingerprint: &PreviewFingerprint) -> Result<SessionState, SessionError> {
        let job = {
            let mut machine = self.inner.lock("run")?;
            if same_fingerprint(&machine, fingerprint) {
                None
            } else {
                self.inner.begin(&mut machine, fingerprint)?
            }
        };

        let Some(job) = job else {
            // A load started by `observe` may still be in flight.
            return Ok(self.settled().await);
        };
        let outcome = load(
            &self.inner.config,
            &self.inner.deps,
            &job.token,
            &job.document_id,
        )
        .await;
        self.inner.complete(job.generation, outcome)?;
        Ok(self.state())
    }

    /// Back to undetermined. Any load in flight is discarded when it lands.
    pub fn reset(&self) -> Result<SessionState, SessionError> {
        let mut machine = self.inner.lock("reset")?;
        machine.generation += 1;
        machine.observed = None;
        self.inner.dispatch(&mut machine, SessionAction::Reset)?;
        Ok(machine.state.clone())
    }

    pub fn state(&self) -> SessionState {
        self.inner.updates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.updates.subscribe()
    }

    /// Wait until the session is not loading.
    pub async fn settled(&self) -> SessionState {
        let mut updates = self.subscribe();
        let settled = match updates.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Every phase the session has been in, in order, without repeats.
    pub fn history(&self) -> Result<Vec<SessionPhase>, SessionError> {
        Ok(self.inner.lock("history")?.history.clone())
    }
}

/// Fetch, load type paths, materialize and resolve.
async fn load(
    config: &EffectiveConfig,
    deps: &PreviewDeps,
    token: &str,
    document_id: &str,
) -> Result<Loaded, PreviewError> {
    let document =
        fetch_preview_document(deps.connector.as_ref(), config, token, document_id).await?;

    let filename = config.type_paths_filename();
    let type_paths = deps.type_paths.load(&filename).await?;
    debug!(%filename, paths = type_paths.len(), "loaded type paths");

    let (root, nodes) =
        materialize_document(deps.materializer.as_ref(), &document, &type_paths, config)?;
    let key = camel_case(root.node_type());
    let path = resolve_path(config.resolution.as_ref(), &document);

    info!(
        repository = %config.repository_name,
        document_id,
        key = %key,
        nodes = nodes.len(),
        "preview document loaded"
    );
    Ok(Loaded {
        preview_data: PreviewData::new(key, root, nodes),
        path,
    })
}
