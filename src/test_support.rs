use std::future::Future;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;

use crate::error::ReportError;
use crate::http::RequestTemplate;
use crate::metrics::RequestResult;
use crate::report::{ReportContext, Reporter};
use crate::work::WorkSpec;

pub(crate) const OK_RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK";
pub(crate) const KEEP_ALIVE_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nOK";

#[derive(Clone)]
pub(crate) struct ServerOptions {
    pub response: &'static [u8],
    pub delay: Duration,
    /// Serve further requests on the same connection instead of closing it.
    pub keep_alive: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            response: OK_RESPONSE,
            delay: Duration::ZERO,
            keep_alive: false,
        }
    }
}

pub(crate) struct TestServer {
    pub url: String,
    served: Arc<AtomicUsize>,
    connections: Arc<AtomicUsize>,
    captured: Arc<Mutex<Vec<String>>>,
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl TestServer {
    pub(crate) fn served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }

    pub(crate) fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub(crate) fn captured(&self) -> Vec<String> {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a lightweight HTTP server that answers every request with
/// `options.response` after `options.delay`.
pub(crate) fn spawn_http_server(options: ServerOptions) -> Result<TestServer, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let served = Arc::new(AtomicUsize::new(0));
    let connections = Arc::new(AtomicUsize::new(0));
    let captured = Arc::new(Mutex::new(Vec::new()));
    let served_clone = Arc::clone(&served);
    let connections_clone = Arc::clone(&connections);
    let captured_clone = Arc::clone(&captured);

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }
            match listener.accept() {
                Ok((stream, _)) => {
                    connections_clone.fetch_add(1, Ordering::SeqCst);
                    let options = options.clone();
                    let served = Arc::clone(&served_clone);
                    let captured = Arc::clone(&captured_clone);
                    thread::spawn(move || handle_client(stream, &options, &served, &captured));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(1));
                }
                Err(_) => break,
            }
        }
    });

    Ok(TestServer {
        url: format!("http://{}/", addr),
        served,
        connections,
        captured,
        shutdown: shutdown_tx,
        thread: Some(handle),
    })
}

fn handle_client(
    mut stream: TcpStream,
    options: &ServerOptions,
    served: &AtomicUsize,
    captured: &Mutex<Vec<String>>,
) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    while let Some(request) = read_request(&mut stream) {
        captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        if !options.delay.is_zero() {
            thread::sleep(options.delay);
        }
        served.fetch_add(1, Ordering::SeqCst);
        if stream.write_all(options.response).is_err() {
            return;
        }
        if stream.flush().is_err() {
            return;
        }
        if !options.keep_alive {
            break;
        }
    }
    drop(stream.shutdown(Shutdown::Both));
}

/// Reads the request head plus a `Content-Length` body, if any. `None` once
/// the peer closed the connection.
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buffer = [0u8; 4096];
    loop {
        let read = stream.read(&mut buffer).ok()?;
        if read == 0 {
            break;
        }
        data.extend_from_slice(buffer.get(..read)?);
        let text = String::from_utf8_lossy(&data);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let body_len = text
                .get(..head_end)?
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if data.len() >= head_end.saturating_add(4).saturating_add(body_len) {
                break;
            }
        }
    }
    if data.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(&data).into_owned())
}

/// A local address nothing listens on.
pub(crate) fn refused_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind port reservation failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("reserved addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}/", addr))
}

pub(crate) fn spec_for(url: &str, requests: usize, concurrency: usize) -> Result<WorkSpec, String> {
    let template = RequestTemplate::new(Method::GET, url).map_err(|err| err.to_string())?;
    let mut spec = WorkSpec::new(template, requests, concurrency);
    spec.timeout = Some(Duration::from_secs(5));
    Ok(spec)
}

pub(crate) fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

/// Keeps every result so tests can inspect them after the run.
#[derive(Default)]
pub(crate) struct CollectingReporter {
    pub results: Vec<RequestResult>,
    pub expected_total: usize,
    pub total: Option<Duration>,
    pub finalize_calls: usize,
}

impl CollectingReporter {
    pub(crate) fn new(context: ReportContext) -> Self {
        Self {
            expected_total: context.expected_total,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Reporter for CollectingReporter {
    fn record(&mut self, result: RequestResult) {
        self.results.push(result);
    }

    fn finalize(&mut self, total: Duration) -> Result<(), ReportError> {
        self.total = Some(total);
        self.finalize_calls = self.finalize_calls.saturating_add(1);
        Ok(())
    }
}
