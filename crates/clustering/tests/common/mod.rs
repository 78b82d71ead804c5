//! Test doubles for clustering integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use modmap_core::entities::{Component, ComponentKind};
use modmap_core::error::{Error, Result};
use modmap_core::registry::ComponentRegistry;
use modmap_clustering::Oracle;
use modmap_graph::{AnalysisOutput, FilePatterns, RawEdge, RawSymbol, SourceAnalyzer};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

static INIT_LOGGING: Once = Once::new();

/// Install a test subscriber filtered by `MODMAP_TEST_LOG`, then `RUST_LOG`
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = std::env::var("MODMAP_TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "error".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Key used for the repository-level prompt
pub const ROOT: &str = "<root>";

/// Module named in a clustering prompt, [`ROOT`] at the repository level
pub fn prompt_module(prompt: &str) -> String {
    prompt
        .split("components of the module ")
        .nth(1)
        .and_then(|rest| rest.split(' ').next())
        .unwrap_or(ROOT)
        .to_string()
}

/// Oracle answering from a per-module script.
///
/// Size is the number of listed components, so budgets in tests count
/// components. Unscripted modules get an answer without a grouping block.
#[derive(Default)]
pub struct ScriptedOracle {
    responses: HashMap<String, String>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    cancel_on_call: Option<CancellationToken>,
    pub prompts: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, module: &str, payload: &str) -> Self {
        self.responses.insert(
            module.to_string(),
            format!("Grouping follows.\n<GROUPED_COMPONENTS>\n{payload}\n</GROUPED_COMPONENTS>"),
        );
        self
    }

    pub fn respond_raw(mut self, module: &str, response: &str) -> Self {
        self.responses.insert(module.to_string(), response.to_string());
        self
    }

    pub fn fail(mut self, module: &str) -> Self {
        self.failing.insert(module.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Cancel `token` on the first call and never answer
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_call = Some(token);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompted_modules(&self) -> Vec<String> {
        let mut modules: Vec<String> = self
            .prompts
            .lock()
            .unwrap()
            .iter()
            .map(|p| prompt_module(p))
            .collect();
        modules.sort();
        modules
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn propose_grouping(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(token) = &self.cancel_on_call {
            token.cancel();
            std::future::pending::<()>().await;
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let module = prompt_module(prompt);
        if self.failing.contains(&module) {
            return Err(Error::oracle("connection reset"));
        }
        Ok(self
            .responses
            .get(&module)
            .cloned()
            .unwrap_or_else(|| "I could not decide on a grouping.".to_string()))
    }

    fn estimate_size(&self, text: &str) -> Result<usize> {
        Ok(text.lines().filter(|line| line.starts_with('\t')).count())
    }
}

pub fn component(id: &str, relative_path: &str) -> Component {
    let (namespace, short_id) = id.split_once('.').unwrap();
    Component::builder()
        .id(id)
        .name(id.rsplit('.').next().unwrap())
        .kind(ComponentKind::Class)
        .relative_path(relative_path)
        .file_path(PathBuf::from("/work").join(namespace).join(relative_path))
        .source_text(format!("class {}:\n    pass", id.rsplit('.').next().unwrap()))
        .short_id(short_id)
        .namespace(namespace)
        .build()
        .unwrap()
}

/// Registry of `ids`, each in `pkg/<lowercase name>.py`
pub fn registry(ids: &[&str]) -> ComponentRegistry {
    ids.iter()
        .map(|id| {
            let name = id.rsplit('.').next().unwrap().to_lowercase();
            component(id, &format!("pkg/{name}.py"))
        })
        .collect()
}

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Analyzer returning canned output per root
#[derive(Default)]
pub struct StaticAnalyzer {
    outputs: HashMap<PathBuf, AnalysisOutput>,
}

impl StaticAnalyzer {
    pub fn with_root(mut self, root: &Path, output: AnalysisOutput) -> Self {
        self.outputs.insert(root.to_path_buf(), output);
        self
    }
}

#[async_trait]
impl SourceAnalyzer for StaticAnalyzer {
    async fn analyze(&self, root: &Path, _patterns: &FilePatterns) -> Result<AnalysisOutput> {
        Ok(self.outputs.get(root).cloned().unwrap_or_default())
    }
}

pub fn symbol(local_id: &str, relative_path: &str) -> RawSymbol {
    let name = local_id.rsplit('.').next().unwrap();
    RawSymbol {
        local_id: local_id.into(),
        name: name.into(),
        kind: "class".into(),
        file_path: PathBuf::from("/src").join(relative_path),
        relative_path: relative_path.into(),
        source_text: format!("class {name}:\n    pass"),
        start_line: 1,
        end_line: 2,
        docstring: None,
        parameters: vec![],
        base_classes: vec![],
    }
}

/// Four classes under one root, two in `auth/` and two in `data/`; Login uses Session
pub fn four_class_output() -> AnalysisOutput {
    AnalysisOutput {
        symbols: vec![
            symbol("auth.Login", "auth/login.py"),
            symbol("auth.Session", "auth/session.py"),
            symbol("data.Store", "data/store.py"),
            symbol("data.Cache", "data/cache.py"),
        ],
        edges: vec![RawEdge::new("auth.Login", "auth.Session", true)],
    }
}
