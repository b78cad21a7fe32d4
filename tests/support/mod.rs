//! Shared test helpers: SSE fixtures and a scripted in-memory transport.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::StreamExt;
use wesai::config::{AssistConfig, KeyStatus};
use wesai::error::{AssistError, Result};
use wesai::protocol::{chunk_to_fragment, parse_chunk};
use wesai::terminal::{Terminal, TerminalPolicy};
use wesai::transport::{
    ChatRequest, Fragment, FragmentStream, GeneratedImage, ImageRequest, Transport,
    TransportFactory,
};

/// Read an `.sse` fixture from `tests/fixtures/gemini/`.
pub fn load_gemini_fixture(name: &str) -> String {
    let path = format!("tests/fixtures/gemini/{name}");
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("load fixture {path}: {e}"))
        .replace("\r\n", "\n")
}

/// Drive a fixture through the SSE decoder and the chunk converter.
pub async fn fixture_fragments(name: &str, policy: &TerminalPolicy) -> Vec<Result<Fragment>> {
    use eventsource_stream::Eventsource;

    let raw = load_gemini_fixture(name);
    let bytes = futures_util::stream::iter(
        raw.split_inclusive("\n\n")
            .map(|chunk| Ok::<_, std::io::Error>(chunk.as_bytes().to_vec()))
            .collect::<Vec<_>>(),
    );
    let mut events = Box::pin(bytes.eventsource());
    let mut out = Vec::new();
    while let Some(event) = events.next().await {
        let event = event.expect("valid SSE event");
        out.push(parse_chunk(&event.data).map(|chunk| chunk_to_fragment(&chunk, policy)));
    }
    out
}

pub fn fixture_stream(fragments: Vec<Result<Fragment>>) -> FragmentStream {
    Box::pin(futures_util::stream::iter(fragments))
}

/// What the scripted transport answers to a stream call.
#[derive(Debug, Clone)]
pub enum StreamScript {
    Fragments(Vec<Result<Fragment>>),
    OpenError(AssistError),
    /// The open never resolves, like a server that never sends headers.
    NeverOpens,
}

impl StreamScript {
    /// Text fragments followed by a normal stop.
    pub fn reply(parts: &[&str]) -> Self {
        let mut fragments: Vec<Result<Fragment>> =
            parts.iter().map(|p| Ok(Fragment::text(*p))).collect();
        fragments.push(Ok(Fragment::terminal(Terminal::stop())));
        Self::Fragments(fragments)
    }
}

#[derive(Debug, Default)]
struct Script {
    streams: VecDeque<StreamScript>,
    generations: VecDeque<Result<String>>,
    images: VecDeque<Result<Vec<GeneratedImage>>>,
}

/// In-memory transport answering from queued scripts and recording requests.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    key_configured: bool,
    script: Arc<Mutex<Script>>,
    chat_requests: Arc<Mutex<Vec<ChatRequest>>>,
    image_requests: Arc<Mutex<Vec<ImageRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            key_configured: true,
            script: Arc::default(),
            chat_requests: Arc::default(),
            image_requests: Arc::default(),
        }
    }

    pub fn without_key() -> Self {
        Self {
            key_configured: false,
            ..Self::new()
        }
    }

    pub fn push_stream(&self, script: StreamScript) -> &Self {
        self.script.lock().unwrap().streams.push_back(script);
        self
    }

    pub fn push_generation(&self, result: Result<String>) -> &Self {
        self.script.lock().unwrap().generations.push_back(result);
        self
    }

    pub fn push_images(&self, result: Result<Vec<GeneratedImage>>) -> &Self {
        self.script.lock().unwrap().images.push_back(result);
        self
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }

    pub fn image_requests(&self) -> Vec<ImageRequest> {
        self.image_requests.lock().unwrap().clone()
    }

    pub fn shared(self) -> Arc<dyn Transport> {
        Arc::new(self)
    }
}

impl KeyStatus for ScriptedTransport {
    fn is_key_configured(&self) -> bool {
        self.key_configured
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn generate(&self, request: ChatRequest) -> Result<String> {
        self.ensure_configured()?;
        self.chat_requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .generations
            .pop_front()
            .expect("no scripted generation left")
    }

    async fn stream(&self, request: ChatRequest) -> Result<FragmentStream> {
        self.ensure_configured()?;
        self.chat_requests.lock().unwrap().push(request);
        let script = self
            .script
            .lock()
            .unwrap()
            .streams
            .pop_front()
            .expect("no scripted stream left");
        match script {
            StreamScript::Fragments(fragments) => Ok(fixture_stream(fragments)),
            StreamScript::OpenError(e) => Err(e),
            StreamScript::NeverOpens => std::future::pending().await,
        }
    }

    async fn generate_images(&self, request: ImageRequest) -> Result<Vec<GeneratedImage>> {
        self.ensure_configured()?;
        self.image_requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .images
            .pop_front()
            .expect("no scripted images left")
    }
}

/// Factory handing out scripted transports and recording the configs it saw.
#[derive(Debug, Default)]
pub struct ScriptedFactory {
    pub configs: Mutex<Vec<AssistConfig>>,
    pub built: Mutex<Vec<ScriptedTransport>>,
}

impl ScriptedFactory {
    pub fn builds(&self) -> usize {
        self.built.lock().unwrap().len()
    }

    pub fn last(&self) -> ScriptedTransport {
        self.built
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no transport built yet")
    }
}

impl TransportFactory for ScriptedFactory {
    fn build(&self, config: &AssistConfig) -> Result<Arc<dyn Transport>> {
        let transport = if config.is_key_configured() {
            ScriptedTransport::new()
        } else {
            ScriptedTransport::without_key()
        };
        self.configs.lock().unwrap().push(config.clone());
        self.built.lock().unwrap().push(transport.clone());
        Ok(transport.shared())
    }
}
