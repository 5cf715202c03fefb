//! Request dispatch
//!
//! Maps one request [`Message`] to one response [`Message`]. GetFont reads the
//! registry; AddFont and DelFont touch the filesystem and the platform
//! registrar, then rescan.
//!
//! Mutating commands are serialised through a single async mutex so two
//! connections cannot interleave a copy, a delete and a rescan.

use std::fs::File;
use std::future::Future;
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;

use crate::fonts::{sniff_reader, FontRecord, FontRegistrar, FontRegistry, RegistrarError};
use crate::socket_server::protocol::{CommandKind, Message, PROTOCOL_VERSION};

/// Failure of a single request. The `Display` text is what the client sees.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("no fonts were selected")]
    NoFontsSelected,

    #[error("no font was selected")]
    NoFontSelected,

    #[error("font {font} could not be found")]
    NotFound { font: String },

    #[error("{path} does not name a file")]
    NoFileName { path: PathBuf },

    #[error("{path} is not a font file")]
    NotAFont { path: PathBuf },

    #[error("open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("copy {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("sync {path}: {source}")]
    Sync {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("remove {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Registrar(#[from] RegistrarError),

    #[error("background task failed: {0}")]
    Task(String),
}

/// How a font file is deleted after it has been unregistered.
///
/// The platform may keep the file open for a moment after unregistering, so
/// deletion waits `grace` and then retries with doubling backoff, bounded by
/// both `attempts` and `max_wait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePolicy {
    pub grace: Duration,
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub max_wait: Duration,
}

impl Default for DeletePolicy {
    fn default() -> Self {
        Self {
            grace: Duration::from_millis(500),
            attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_wait: Duration::from_secs(3),
        }
    }
}

impl DeletePolicy {
    /// Delete `path` per this policy
    pub async fn delete(&self, path: &Path) -> io::Result<()> {
        self.delete_with(path, |p| tokio::fs::remove_file(p)).await
    }

    /// Run the retry loop with a custom remover.
    ///
    /// `NotFound` is returned immediately; every other error is retried.
    pub async fn delete_with<F, Fut>(&self, path: &Path, mut remove: F) -> io::Result<()>
    where
        F: FnMut(PathBuf) -> Fut,
        Fut: Future<Output = io::Result<()>>,
    {
        tokio::time::sleep(self.grace).await;

        let deadline = Instant::now() + self.max_wait;
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;
        loop {
            match remove(path.to_path_buf()).await {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(e),
                Err(e) => {
                    if attempt >= self.attempts.max(1) || Instant::now() + backoff > deadline {
                        return Err(e);
                    }
                    tracing::warn!(
                        "Delete attempt {} for {} failed ({}), retrying in {:?}",
                        attempt,
                        path.display(),
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
            }
        }
    }
}

/// Maps requests to responses against a shared registry
pub struct ProtocolHandler {
    mutator: Mutator,
}

/// Everything a mutating command needs, cheap to clone into its own task.
///
/// AddFont and DelFont run on a detached task that owns a clone of this, so
/// aborting the connection that asked for them cannot stop them halfway.
#[derive(Clone)]
struct Mutator {
    registry: Arc<FontRegistry>,
    registrar: Arc<dyn FontRegistrar>,
    delete_policy: DeletePolicy,
    lock: Arc<Mutex<()>>,
}

impl ProtocolHandler {
    pub fn new(registry: Arc<FontRegistry>, registrar: Arc<dyn FontRegistrar>) -> Self {
        Self {
            mutator: Mutator {
                registry,
                registrar,
                delete_policy: DeletePolicy::default(),
                lock: Arc::new(Mutex::new(())),
            },
        }
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.mutator.delete_policy = policy;
        self
    }

    pub fn registry(&self) -> &Arc<FontRegistry> {
        &self.mutator.registry
    }

    /// Produce the response for `request`
    pub async fn handle(&self, request: Message) -> Message {
        let mut response = match request.kind {
            CommandKind::GetFont => {
                Message::ok(CommandKind::GetFont, "").with_fonts(self.registry().fonts())
            }
            CommandKind::AddFont => self.add_font(&request.fonts).await,
            CommandKind::DelFont => self.del_font(&request.fonts).await,
            CommandKind::Heartbeat => Message::ok(CommandKind::Heartbeat, ""),
            CommandKind::Unknown => Message::failed(CommandKind::Unknown, "unrecognized type"),
        };
        response.version = PROTOCOL_VERSION;
        response
    }

    /// Wait until every AddFont/DelFont already started or queued has
    /// finished. Used by shutdown after connections are gone.
    pub async fn settle(&self) {
        let _guard = self.mutator.lock.lock().await;
    }

    async fn add_font(&self, fonts: &[FontRecord]) -> Message {
        // Only the first entry is honoured
        let Some(font) = fonts.first() else {
            return Message::failed(CommandKind::AddFont, RequestError::NoFontsSelected.to_string());
        };
        let source = PathBuf::from(&font.path);
        tracing::info!("Adding font {}", source.display());

        let task = tokio::spawn(self.mutator.clone().add(source));
        task.await.unwrap_or_else(|e| {
            Message::failed(CommandKind::AddFont, RequestError::Task(e.to_string()).to_string())
        })
    }

    async fn del_font(&self, fonts: &[FontRecord]) -> Message {
        let Some(font) = fonts.first() else {
            return Message::failed(CommandKind::DelFont, RequestError::NoFontSelected.to_string());
        };

        let task = tokio::spawn(self.mutator.clone().remove(font.clone()));
        task.await.unwrap_or_else(|e| {
            Message::failed(CommandKind::DelFont, RequestError::Task(e.to_string()).to_string())
        })
    }
}

impl Mutator {
    async fn add(self, source: PathBuf) -> Message {
        let _guard = Arc::clone(&self.lock).lock_owned().await;
        match self.install(source.clone()).await {
            Ok(dest) => {
                tracing::info!("Installed {} as {}", source.display(), dest.display());
                self.refresh().await;
                Message::ok(
                    CommandKind::AddFont,
                    format!("font {} installed", source.display()),
                )
            }
            Err(e) => {
                tracing::warn!("Adding {} failed: {}", source.display(), e);
                Message::failed(CommandKind::AddFont, e.to_string())
            }
        }
    }

    async fn install(&self, source: PathBuf) -> Result<PathBuf, RequestError> {
        let dir = self.registry.directory().to_path_buf();
        let registrar = Arc::clone(&self.registrar);
        tokio::task::spawn_blocking(move || {
            let dest = copy_into(&source, &dir)?;
            // A failed registration leaves the copy in place
            registrar.register(&dest)?;
            Ok(dest)
        })
        .await
        .map_err(|e| RequestError::Task(e.to_string()))?
    }

    async fn remove(self, font: FontRecord) -> Message {
        let _guard = Arc::clone(&self.lock).lock_owned().await;
        let Some(record) = self.registry.lookup(&font.id) else {
            let shown = if font.path.is_empty() {
                font.id.clone()
            } else {
                font.path.clone()
            };
            tracing::info!("Delete requested for unknown font id {}", font.id);
            return Message::failed(
                CommandKind::DelFont,
                RequestError::NotFound { font: shown }.to_string(),
            );
        };

        tracing::info!("Uninstalling font {}", record.path);
        match self.uninstall(&record).await {
            Ok(()) => {
                self.refresh().await;
                Message::ok(
                    CommandKind::DelFont,
                    format!("{} was uninstalled", record.display_name),
                )
            }
            Err(e) => {
                tracing::warn!("Uninstalling {} failed: {}", record.path, e);
                Message::failed(CommandKind::DelFont, e.to_string())
            }
        }
    }

    async fn uninstall(&self, record: &FontRecord) -> Result<(), RequestError> {
        let path = PathBuf::from(&record.path);
        let registrar = Arc::clone(&self.registrar);
        let target = path.clone();
        tokio::task::spawn_blocking(move || registrar.unregister(&target))
            .await
            .map_err(|e| RequestError::Task(e.to_string()))??;

        self.delete_policy
            .delete(&path)
            .await
            .map_err(|source| RequestError::Delete { path, source })
    }

    async fn refresh(&self) {
        let registry = Arc::clone(&self.registry);
        match tokio::task::spawn_blocking(move || registry.rescan()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!("Rescan after mutation failed: {}", e),
            Err(e) => tracing::error!("Rescan task failed: {}", e),
        }
    }
}

/// Copy `source` into `dir` under its base name and flush it to storage.
///
/// The source must sniff as a font; anything else would land in the
/// directory without ever showing up in the registry.
fn copy_into(source: &Path, dir: &Path) -> Result<PathBuf, RequestError> {
    let mut src = File::open(source).map_err(|e| RequestError::Open {
        path: source.to_path_buf(),
        source: e,
    })?;
    let name = source.file_name().ok_or_else(|| RequestError::NoFileName {
        path: source.to_path_buf(),
    })?;

    let is_font = sniff_reader(&mut src).map_err(|e| RequestError::Open {
        path: source.to_path_buf(),
        source: e,
    })?;
    if !is_font {
        return Err(RequestError::NotAFont {
            path: source.to_path_buf(),
        });
    }
    src.seek(SeekFrom::Start(0)).map_err(|e| RequestError::Copy {
        path: source.to_path_buf(),
        source: e,
    })?;

    let dest = dir.join(name);

    // Creating the destination would truncate a source that already lives there
    if source.canonicalize().ok().as_deref() == Some(dest.as_path()) {
        tracing::info!("{} is already in the font directory", dest.display());
        return Ok(dest);
    }

    let mut dst = File::create(&dest).map_err(|e| RequestError::Create {
        path: dest.clone(),
        source: e,
    })?;
    io::copy(&mut src, &mut dst).map_err(|e| RequestError::Copy {
        path: dest.clone(),
        source: e,
    })?;
    dst.sync_all().map_err(|e| RequestError::Sync {
        path: dest.clone(),
        source: e,
    })?;
    Ok(dest)
}
