/// Background geo-cube fetching
///
/// Reading and decoding a geo-cube is slow enough to stall the caller, so it
/// runs on a dedicated thread. Requests carry an id; the session compares it
/// with the id of the phase it is waiting for to spot stale responses.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use geocube::{CubeError, CubeShape, GeoCube};

/// Source of raw geo-cube bytes
pub trait AssetFetcher: Send + 'static {
    fn fetch(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads assets from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl AssetFetcher for FileFetcher {
    fn fetch(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

struct CubeRequest {
    id: u64,
    phase: u32,
    path: PathBuf,
}

enum ThreadMessage {
    Fetch(CubeRequest),
    Shutdown,
}

/// Outcome of one fetch request
#[derive(Debug)]
pub struct CubeResponse {
    pub id: u64,
    pub phase: u32,
    pub path: PathBuf,
    pub result: Result<GeoCube, CubeError>,
}

pub struct GeoCubeWorker {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<CubeResponse>,
    thread_handle: Option<JoinHandle<()>>,
    next_id: u64,
    pending: HashSet<u64>,
}

impl GeoCubeWorker {
    /// Spawn a worker decoding full-size geo-cubes
    pub fn spawn(fetcher: Box<dyn AssetFetcher>) -> io::Result<Self> {
        Self::spawn_with_shape(fetcher, CubeShape::GEO)
    }

    pub fn spawn_with_shape(fetcher: Box<dyn AssetFetcher>, shape: CubeShape) -> io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<CubeResponse>();

        let thread_handle = thread::Builder::new()
            .name("geocube-fetch".to_string())
            .spawn(move || {
                log::debug!("Geo-cube fetch thread started");
                Self::thread_loop(fetcher.as_ref(), shape, request_rx, result_tx);
                log::debug!("Geo-cube fetch thread exiting");
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            next_id: 0,
            pending: HashSet::new(),
        })
    }

    fn thread_loop(
        fetcher: &dyn AssetFetcher,
        shape: CubeShape,
        request_rx: Receiver<ThreadMessage>,
        result_tx: Sender<CubeResponse>,
    ) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Fetch(request)) => {
                    let result = fetcher
                        .fetch(&request.path)
                        .map_err(CubeError::from)
                        .and_then(|bytes| GeoCube::decode_with_shape(&bytes, shape));
                    if let Err(e) = &result {
                        log::debug!("Fetch {} failed: {}", request.id, e);
                    }
                    let response = CubeResponse {
                        id: request.id,
                        phase: request.phase,
                        path: request.path,
                        result,
                    };
                    if result_tx.send(response).is_err() {
                        log::warn!("Result channel closed, fetch thread exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) | Err(_) => break,
            }
        }
    }

    /// Queue a fetch and return its request id
    pub fn request(&mut self, phase: u32, path: PathBuf) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        log::debug!("Requesting geo-cube {} for phase {}: {}", id, phase, path.display());
        let request = CubeRequest { id, phase, path };
        if self.request_tx.send(ThreadMessage::Fetch(request)).is_err() {
            log::error!("Failed to send fetch request: channel closed");
        } else {
            self.pending.insert(id);
        }
        id
    }

    fn settle(&mut self, response: CubeResponse) -> CubeResponse {
        self.pending.remove(&response.id);
        response
    }

    /// Take one finished response without blocking
    pub fn try_take(&mut self) -> Option<CubeResponse> {
        match self.result_rx.try_recv() {
            Ok(response) => Some(self.settle(response)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("Geo-cube fetch thread disconnected");
                None
            }
        }
    }

    /// Block for the next finished response, up to `timeout`
    pub fn wait(&mut self, timeout: Duration) -> Result<CubeResponse, RecvTimeoutError> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(response) => Ok(self.settle(response)),
            Err(e) => {
                if e == RecvTimeoutError::Disconnected {
                    log::warn!("Geo-cube fetch thread disconnected");
                }
                Err(e)
            }
        }
    }

    pub fn is_pending(&self, id: u64) -> bool {
        self.pending.contains(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for GeoCubeWorker {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Geo-cube fetch thread panicked");
            }
        }
    }
}
