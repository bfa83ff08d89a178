#![allow(dead_code)]

use json_component_validator::config::Config;
use json_component_validator::error::JcvError;
use json_component_validator::{ShutdownHandle, prepare_server};
use reqwest::blocking::Client;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

pub fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .display()
        .to_string()
}

pub fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).expect("fixture should be readable")
}

/// Loopback, ephemeral port, two workers. Built from defaults so the
/// environment of the test process does not leak in.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.set_host("127.0.0.1".to_string());
    config.set_port(0);
    config.set_workers(2);
    config
}

pub fn client() -> Client {
    Client::builder()
        .no_proxy()
        .build()
        .expect("client should build")
}

/// A validator serving on a background thread; stopped when dropped.
pub struct RunningServer {
    pub base_url: String,
    handle: ShutdownHandle,
    thread: Option<JoinHandle<Result<(), JcvError>>>,
}

impl RunningServer {
    pub fn start(source: &str) -> RunningServer {
        RunningServer::start_with(source, &test_config())
    }

    pub fn start_with(source: &str, config: &Config) -> RunningServer {
        let server = prepare_server(source, config).expect("server should start");
        let addr = server.local_addr().expect("server should have an ip address");
        let handle = server.shutdown_handle();
        let thread = thread::spawn(move || server.run());
        RunningServer {
            base_url: format!("http://{}", addr),
            handle,
            thread: Some(thread),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Stops the server and returns what `run` returned.
    pub fn stop(mut self) -> Result<(), JcvError> {
        self.handle.shutdown();
        match self.thread.take() {
            Some(thread) => thread.join().expect("server thread should not panic"),
            None => Ok(()),
        }
    }

    /// Waits for `run` to return on its own.
    pub fn join(mut self) -> Result<(), JcvError> {
        match self.thread.take() {
            Some(thread) => thread.join().expect("server thread should not panic"),
            None => Ok(()),
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.handle.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
