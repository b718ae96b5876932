//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use archive_streamer::archive::StreamTracker;
use archive_streamer::config::{ArchiverConfig, ServerConfig};
use archive_streamer::http::HttpServer;
use archive_streamer::lifecycle::Shutdown;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const INDEX_PAGE: &str = "<html><body>index</body></html>";
pub const NOT_FOUND_PAGE: &str = "<html><body>not found</body></html>";

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub tracker: StreamTracker,
    pub handle: JoinHandle<std::io::Result<()>>,
    /// Scratch root holding `photos/` and the page files.
    pub root: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn photos(&self) -> PathBuf {
        self.root.path().join("photos")
    }
}

/// Scratch layout: `<root>/photos` as base dir, pages next to it.
pub fn scratch_config(archiver: ArchiverConfig, delay_secs: f64) -> (TempDir, ServerConfig) {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("photos")).unwrap();
    std::fs::write(root.path().join("index.html"), INDEX_PAGE).unwrap();
    std::fs::write(root.path().join("404.html"), NOT_FOUND_PAGE).unwrap();

    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.archive.base_dir = root.path().join("photos");
    config.archive.response_delay_secs = delay_secs;
    config.archive.archiver = archiver;
    config.archive.shutdown_grace_secs = 5;
    config.pages.index_path = root.path().join("index.html");
    config.pages.not_found_path = root.path().join("404.html");
    (root, config)
}

/// Start a server for `config`; `root` is kept alive with it.
pub async fn start_server(root: TempDir, config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, shutdown.clone());
    let tracker = server.tracker().clone();
    let handle = tokio::spawn(server.run(listener));

    TestServer {
        addr,
        shutdown,
        tracker,
        handle,
        root,
    }
}

/// Archiver run as `sh -c <script>`; the identifier arrives as `$0`.
pub fn sh_archiver(script: &str) -> ArchiverConfig {
    ArchiverConfig {
        program: "sh".into(),
        args: vec!["-c".into(), script.into()],
    }
}

/// An archiver that can never be spawned.
pub fn missing_archiver() -> ArchiverConfig {
    ArchiverConfig {
        program: "/nonexistent/archiver".into(),
        args: vec![],
    }
}

/// Create `<base>/<id>` holding a few files, `size` bytes in total.
pub fn make_album(base: &Path, id: &str, size: usize) {
    let dir = base.join(id);
    std::fs::create_dir_all(&dir).unwrap();
    let per_file = size / 3;
    for (i, name) in ["a.jpg", "b.jpg", "c.jpg"].iter().enumerate() {
        let len = if i == 2 { size - 2 * per_file } else { per_file };
        let data: Vec<u8> = (0..len).map(|j| ((j * 31 + i * 7) % 256) as u8).collect();
        std::fs::write(dir.join(name), data).unwrap();
    }
}

/// HTTP client that neither follows redirects nor uses a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Whether `pid` still exists (Linux only; elsewhere always false).
pub fn process_alive(pid: u32) -> bool {
    if cfg!(target_os = "linux") {
        Path::new(&format!("/proc/{pid}")).exists()
    } else {
        false
    }
}

/// Poll `path` until it holds a PID.
pub async fn read_pid(path: &Path) -> u32 {
    for _ in 0..100 {
        if let Ok(text) = std::fs::read_to_string(path) {
            if let Ok(pid) = text.trim().parse() {
                return pid;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("archiver never wrote its pid to {}", path.display());
}
