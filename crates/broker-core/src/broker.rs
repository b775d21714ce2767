use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::BrokerConfig;
use crate::dispatcher::{create_register_pipe, Dispatcher};
use crate::queue::BoundedQueue;
use crate::registry::BoxRegistry;
use crate::session;

/// A running broker: the rendezvous dispatcher thread plus a fixed pool
/// of worker threads draining the registration queue.
///
/// `SIGPIPE` is ignored for the process's lifetime (a subscriber's pipe
/// closing mid-write must surface as a normal I/O error, not kill the
/// broker) and `SIGINT` requests an orderly shutdown.
pub struct Broker {
    registry: Arc<BoxRegistry>,
    queue: Arc<BoundedQueue<mbroker_proto::RegistrationFrame>>,
    shutdown: Arc<AtomicBool>,
    dispatcher_handle: Option<JoinHandle<()>>,
    worker_handles: Vec<JoinHandle<()>>,
}

impl Broker {
    /// Creates the register pipe, spawns the dispatcher and worker pool,
    /// and installs signal handlers. Blocks until the pipe and signal
    /// handlers are set up, then returns immediately -- the broker keeps
    /// running on its own threads.
    pub fn start(config: BrokerConfig) -> std::io::Result<Self> {
        ignore_sigpipe();

        let shutdown = Arc::new(AtomicBool::new(false));
        register_sigint(&shutdown)?;

        create_register_pipe(&config.register_pipe_path)?;

        let registry = Arc::new(BoxRegistry::new(config.shutdown_poll_interval));
        let queue = Arc::new(BoundedQueue::new(config.queue_capacity));

        let mut dispatcher = Dispatcher::open(&config.register_pipe_path, Arc::clone(&shutdown))?;
        let dispatcher_queue = Arc::clone(&queue);
        let dispatcher_handle = std::thread::spawn(move || {
            dispatcher.run(&dispatcher_queue);
        });

        let worker_handles = (0..config.worker_count)
            .map(|id| {
                spawn_worker(
                    id,
                    Arc::clone(&queue),
                    Arc::clone(&registry),
                    Arc::clone(&shutdown),
                )
            })
            .collect();

        info!(
            register_pipe = %config.register_pipe_path,
            workers = config.worker_count,
            "broker started"
        );

        Ok(Self {
            registry,
            queue,
            shutdown,
            dispatcher_handle: Some(dispatcher_handle),
            worker_handles,
        })
    }

    pub fn registry(&self) -> &Arc<BoxRegistry> {
        &self.registry
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.queue.shut_down();
    }

    /// True once `SIGINT` has been received or `request_shutdown` called.
    ///
    /// The dispatcher thread watches this flag directly, but it alone
    /// doesn't wake a worker blocked on an empty queue -- callers driving
    /// their own shutdown loop should still call `request_shutdown` once
    /// this flips, to unblock the workers too.
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Blocks until every worker and the dispatcher have exited.
    pub fn join(mut self) {
        if let Some(handle) = self.dispatcher_handle.take() {
            let _ = handle.join();
        }
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// A session that hits a protocol invariant violation (an unrecognized
/// opcode on its own pipe) doesn't just end that one session: per §7's
/// error policy, it shuts the whole broker down, so every worker and the
/// dispatcher stop taking new work.
fn spawn_worker(
    id: usize,
    queue: Arc<BoundedQueue<mbroker_proto::RegistrationFrame>>,
    registry: Arc<BoxRegistry>,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while let Some(registration) = queue.dequeue() {
            if let Err(err) = session::dispatch(&registry, registration) {
                warn!(worker = id, %err, "worker session failed");
                if err.is_fatal() {
                    warn!(worker = id, "fatal session error, shutting broker down");
                    shutdown.store(true, Ordering::Relaxed);
                    queue.shut_down();
                    break;
                }
            }
        }
        info!(worker = id, "worker exiting");
    })
}

fn ignore_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }
}

fn register_sigint(shutdown: &Arc<AtomicBool>) -> std::io::Result<()> {
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(shutdown)).map(|_| ())
}

/// How long `request_shutdown` should be given to take effect before a
/// caller gives up waiting, used by tests and the CLI's own shutdown path.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);
