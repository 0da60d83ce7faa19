// crates/portainer-deployer-cli/src/tests/support.rs
// ============================================================================
// Module: CLI Test Support
// Description: Fake stack APIs, settings fixtures, and capture helpers.
// Purpose: Drive the dispatcher without a network.
// Dependencies: portainer-deployer-cli, tempfile
// ============================================================================

#![allow(dead_code, reason = "Shared helpers are not used by every test module.")]

use std::cell::Cell;
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;

use portainer_deployer_config::ConfigLocator;
use portainer_deployer_config::ConnectionProfile;
use portainer_deployer_core::ResponseEnvelope;
use tempfile::TempDir;

use crate::api_client::ApiError;
use crate::api_client::StackApi;
use crate::api_client::StackSelector;
use crate::audit::ApiCallEvent;
use crate::audit::AuditSink;
use crate::cli::Command;
use crate::dispatch::ApiConnector;
use crate::dispatch::DispatchContext;
use crate::dispatch::Streams;
use crate::dispatch::dispatch;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Settings file contents used by most tests.
pub const SETTINGS: &str = r#"
[PORTAINER]
url = "http://127.0.0.1"
port = "9000"
token = "ptr_secret"
ssl = "true"
"#;

/// Compose document with one service.
pub const STACK_YAML: &str = "services:\n  web:\n    image: nginx:1.24\n";

/// Scratch directory holding a settings file and a locator pointing at it.
pub struct Workspace {
    pub dir: TempDir,
    pub locator_path: PathBuf,
    pub settings_path: PathBuf,
}

impl Workspace {
    /// Creates a configured workspace.
    pub fn configured() -> Self {
        let workspace = Self::unconfigured();
        fs::write(&workspace.settings_path, SETTINGS).unwrap();
        ConfigLocator::at(&workspace.locator_path)
            .update_settings_path(&workspace.settings_path)
            .unwrap();
        workspace
    }

    /// Creates a workspace whose locator does not exist yet.
    pub fn unconfigured() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let locator_path = dir.path().join("locator.toml");
        let settings_path = dir.path().join("settings.toml");
        Self {
            dir,
            locator_path,
            settings_path,
        }
    }

    /// Writes a file inside the workspace.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Builds a dispatch context using this workspace's locator.
    pub fn context(&self, piped_stack: Option<&str>) -> DispatchContext {
        DispatchContext {
            locator: ConfigLocator::at(&self.locator_path),
            piped_stack: piped_stack.map(str::to_string),
        }
    }
}

// ============================================================================
// SECTION: Fake API
// ============================================================================

/// Call observed by the fake API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(StackSelector),
    PostString {
        content: String,
        endpoint_id: u64,
        name: Option<String>,
    },
    PostFile {
        path: PathBuf,
        endpoint_id: u64,
        name: Option<String>,
        content_at_call: String,
    },
}

/// Stack API that records calls and answers with success.
struct FakeApi {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl StackApi for FakeApi {
    fn get_stack(&self, selector: &StackSelector, _out: &mut dyn Write) -> ResponseEnvelope {
        self.calls.borrow_mut().push(Call::Get(selector.clone()));
        ResponseEnvelope::success("Stack(s) pulled successfully", Some(200))
    }

    fn post_stack_from_string(
        &self,
        content: &str,
        endpoint_id: u64,
        name: Option<&str>,
        _out: &mut dyn Write,
    ) -> ResponseEnvelope {
        self.calls.borrow_mut().push(Call::PostString {
            content: content.to_string(),
            endpoint_id,
            name: name.map(str::to_string),
        });
        ResponseEnvelope::success("Stack(s) pushed successfully", Some(200))
    }

    fn post_stack_from_file(
        &self,
        path: &Path,
        endpoint_id: u64,
        name: Option<&str>,
        _out: &mut dyn Write,
    ) -> ResponseEnvelope {
        self.calls.borrow_mut().push(Call::PostFile {
            path: path.to_path_buf(),
            endpoint_id,
            name: name.map(str::to_string),
            content_at_call: fs::read_to_string(path).unwrap_or_default(),
        });
        ResponseEnvelope::success("posted", Some(200))
    }
}

/// Connector handing out [`FakeApi`] instances sharing one call log.
#[derive(Default)]
pub struct FakeConnector {
    pub calls: Rc<RefCell<Vec<Call>>>,
    pub connects: Cell<usize>,
    pub profiles: RefCell<Vec<ConnectionProfile>>,
}

impl FakeConnector {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl ApiConnector for FakeConnector {
    fn connect(&self, profile: ConnectionProfile) -> Result<Box<dyn StackApi>, ApiError> {
        self.connects.set(self.connects.get() + 1);
        self.profiles.borrow_mut().push(profile);
        Ok(Box::new(FakeApi {
            calls: Rc::clone(&self.calls),
        }))
    }
}

// ============================================================================
// SECTION: Capture
// ============================================================================

/// Envelope plus everything written to the output streams.
pub struct Outcome {
    pub envelope: ResponseEnvelope,
    pub out: String,
    pub err: String,
}

/// Dispatches `command` while capturing both streams.
pub fn run(command: Command, context: &DispatchContext, connector: &dyn ApiConnector) -> Outcome {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let mut streams = Streams {
        out: &mut out,
        err: &mut err,
    };
    let envelope = dispatch(command, context, connector, &mut streams);
    Outcome {
        envelope,
        out: String::from_utf8(out).unwrap(),
        err: String::from_utf8(err).unwrap(),
    }
}

/// Audit sink that keeps events in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    pub events: Mutex<Vec<ApiCallEvent>>,
}

impl RecordingAuditSink {
    pub fn events(&self) -> Vec<ApiCallEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &ApiCallEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
