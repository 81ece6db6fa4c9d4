//! Classification coordinator.
//!
//! Owns background resource loading, a fixed pool of classification
//! workers, and the single-flight inference critical section.
//!
//! ```text
//! NluEngine::builder().config(..).build()
//!        │
//!        ├── loader thread: metadata + model ──► OnceLatch<Resources>
//!        ├── WordpieceEncoder: vocabulary ─────► (internal latch)
//!        └── worker threads ◄── job channel ◄── classify()
//!                 │
//!                 └──► ClassificationHandle (one result, exactly once)
//! ```
//!
//! Every failure reachable during a call lands in the result's error field;
//! classification never raises. Load failures degrade: the engine stays up
//! and reports the missing resource per call.

use crate::config::NluConfig;
use crate::context::{NluContext, TraceLevel};
use crate::decoder;
use crate::encoder::{TextEncoder, WordpieceEncoder};
use crate::metadata::Metadata;
use crate::model::{self, InferenceModel, INTENT_OUTPUT, TAG_OUTPUT};
use crate::result::{ClassificationResult, NluError};
use crate::slots::{ParserFactory, ParserRegistry, Slot};
use crate::sync::OnceLatch;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Resources produced by the background loader. Failures are stored, not
/// raised: each classification that needs a missing resource reports it.
struct Resources {
    metadata: Result<Metadata, NluError>,
    model: Result<Mutex<Box<dyn InferenceModel>>, NluError>,
}

struct Job {
    utterance: String,
    reply: Sender<ClassificationResult>,
}

/// Pending result of one [`NluEngine::classify`] call.
///
/// The result is delivered exactly once; `wait` consumes the handle.
pub struct ClassificationHandle {
    utterance: String,
    rx: Receiver<ClassificationResult>,
}

impl ClassificationHandle {
    /// Block until the result is available.
    pub fn wait(self) -> ClassificationResult {
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => ClassificationResult::error(
                self.utterance,
                NluError::Load("engine shut down before the result was delivered".into()),
            ),
        }
    }

    /// The result, if already available.
    pub fn try_wait(&self) -> Option<ClassificationResult> {
        self.rx.try_recv().ok()
    }
}

/// Intent and slot classification engine.
pub struct NluEngine {
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    max_tokens: usize,
}

impl NluEngine {
    /// Start configuring an engine.
    pub fn builder() -> NluEngineBuilder {
        NluEngineBuilder::new()
    }

    /// Maximum encoded tokens accepted per utterance.
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Queue an utterance for classification.
    ///
    /// Never fails synchronously. Calls issued before background loading
    /// completes queue behind readiness; calls issued after [`close`]
    /// resolve immediately with a load-state error result.
    ///
    /// [`close`]: Self::close
    pub fn classify(&self, utterance: &str) -> ClassificationHandle {
        let (tx, rx) = bounded(1);
        let handle = ClassificationHandle {
            utterance: utterance.to_string(),
            rx,
        };
        let job = Job {
            utterance: utterance.to_string(),
            reply: tx,
        };
        match &self.jobs {
            Some(jobs) => {
                if let Err(refused) = jobs.send(job) {
                    let job = refused.into_inner();
                    let _ = job.reply.send(ClassificationResult::error(
                        job.utterance.clone(),
                        NluError::Load("engine is closed".into()),
                    ));
                }
            }
            None => {
                let _ = job.reply.send(ClassificationResult::error(
                    job.utterance.clone(),
                    NluError::Load("engine is closed".into()),
                ));
            }
        }
        handle
    }

    /// Stop accepting work, drain queued jobs, and join the workers.
    pub fn close(&mut self) {
        self.jobs = None;
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for NluEngine {
    fn drop(&mut self) {
        self.close();
    }
}

/// Configures and starts an [`NluEngine`].
pub struct NluEngineBuilder {
    config: NluConfig,
    context: Arc<NluContext>,
    encoder: Option<Arc<dyn TextEncoder>>,
    model: Option<Box<dyn InferenceModel>>,
    factories: Vec<(String, ParserFactory)>,
}

impl NluEngineBuilder {
    fn new() -> Self {
        Self {
            config: NluConfig::default(),
            context: Arc::new(NluContext::new()),
            encoder: None,
            model: None,
            factories: Vec::new(),
        }
    }

    /// Use the given configuration.
    pub fn config(mut self, config: NluConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a listener for trace events from loading and classification.
    pub fn trace_listener(
        self,
        listener: impl Fn(TraceLevel, &str) + Send + Sync + 'static,
    ) -> Self {
        self.context.add_trace_listener(Box::new(listener));
        self
    }

    /// Use a pre-built encoder instead of loading the configured vocabulary.
    pub fn encoder(mut self, encoder: Arc<dyn TextEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Use a pre-built model instead of loading the configured model path.
    pub fn model(mut self, model: Box<dyn InferenceModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Register a slot parser factory under `name`, overriding a built-in
    /// of the same name.
    pub fn parser_factory(mut self, name: impl Into<String>, factory: ParserFactory) -> Self {
        self.factories.push((name.into(), factory));
        self
    }

    /// Start the engine. Returns immediately; resource loading continues on
    /// a background thread and classification calls queue behind readiness.
    pub fn build(self) -> NluEngine {
        let config = self.config;
        let context = self.context;

        let encoder: Arc<dyn TextEncoder> = match self.encoder {
            Some(encoder) => encoder,
            None => Arc::new(WordpieceEncoder::new(
                config.vocab_path.clone(),
                Arc::clone(&context),
            )),
        };

        let mut registry = ParserRegistry::new(config.slot_parsers.clone(), Arc::clone(&context));
        for (name, factory) in self.factories {
            registry.register(name, factory);
        }
        let registry = Arc::new(registry);

        let latch = Arc::new(OnceLatch::new());
        spawn_loader(
            Arc::clone(&latch),
            Arc::clone(&context),
            config.metadata_path.clone(),
            config.model_path.clone(),
            config.max_tokens,
            self.model,
        );

        let (jobs_tx, jobs_rx) = unbounded::<Job>();
        let workers = (0..config.workers.max(1))
            .map(|_| {
                let jobs = jobs_rx.clone();
                let latch = Arc::clone(&latch);
                let encoder = Arc::clone(&encoder);
                let registry = Arc::clone(&registry);
                let context = Arc::clone(&context);
                let max_tokens = config.max_tokens;
                thread::spawn(move || {
                    for job in jobs.iter() {
                        let resources = latch.wait();
                        let result = classify_one(
                            &job.utterance,
                            &resources,
                            encoder.as_ref(),
                            &registry,
                            &context,
                            max_tokens,
                        );
                        let _ = job.reply.send(result);
                    }
                })
            })
            .collect();

        NluEngine {
            jobs: Some(jobs_tx),
            workers,
            max_tokens: config.max_tokens,
        }
    }
}

/// Load metadata and the model once, then publish through the latch.
fn spawn_loader(
    latch: Arc<OnceLatch<Resources>>,
    context: Arc<NluContext>,
    metadata_path: String,
    model_path: String,
    max_tokens: usize,
    prebuilt_model: Option<Box<dyn InferenceModel>>,
) {
    thread::spawn(move || {
        let metadata = Metadata::load(Path::new(&metadata_path)).map_err(|e| {
            context.trace_error(&format!("Error loading NLU metadata: {}", e));
            NluError::Load(e.to_string())
        });

        let model = match prebuilt_model {
            Some(model) => Ok(Mutex::new(model)),
            None => model::load_model(Path::new(&model_path), max_tokens)
                .map(Mutex::new)
                .map_err(|e| {
                    context.trace_error(&format!("Error loading NLU model: {}", e));
                    NluError::Load(e.to_string())
                }),
        };

        latch.set(Resources { metadata, model });
        context.trace_debug("NLU resources ready");
    });
}

/// Run the full pipeline for one utterance:
/// encode → validate → infer → decode → parse.
fn classify_one(
    utterance: &str,
    resources: &Resources,
    encoder: &dyn TextEncoder,
    registry: &ParserRegistry,
    context: &NluContext,
    max_tokens: usize,
) -> ClassificationResult {
    let encoded = match encoder.encode(utterance) {
        Ok(encoded) => encoded,
        Err(e) => return ClassificationResult::error(utterance, NluError::Encoding(e.to_string())),
    };
    if encoded.len() > max_tokens {
        return ClassificationResult::error(
            utterance,
            NluError::LengthLimit {
                count: encoded.len(),
                max: max_tokens,
            },
        );
    }

    let metadata = match &resources.metadata {
        Ok(metadata) => metadata,
        Err(e) => return ClassificationResult::error(utterance, e.clone()),
    };
    let model = match &resources.model {
        Ok(model) => model,
        Err(e) => return ClassificationResult::error(utterance, e.clone()),
    };

    // Critical section: the model's buffers admit one forward pass at a
    // time. Outputs are copied out so decoding and parsing run unlocked.
    let (intent_output, tag_output) = {
        let mut model = model.lock();
        let count = encoded.len();
        {
            let input = model.input(0);
            if count > input.len() {
                return ClassificationResult::error(
                    utterance,
                    NluError::Inference(format!(
                        "model input capacity {} below token count {}",
                        input.len(),
                        count
                    )),
                );
            }
            input[..count].copy_from_slice(encoded.ids());
            for padding in input[count..].iter_mut() {
                *padding = 0;
            }
        }
        if let Err(e) = model.run() {
            return ClassificationResult::error(utterance, NluError::Inference(e.to_string()));
        }
        (
            model.output(INTENT_OUTPUT).to_vec(),
            model.output(TAG_OUTPUT).to_vec(),
        )
    };

    let (intent, confidence) = match decoder::decode_intent(metadata, &intent_output) {
        Ok(decoded) => decoded,
        Err(e) => return ClassificationResult::error(utterance, e),
    };
    let raw_slots = match decoder::decode_slots(context, metadata, &encoded, &tag_output) {
        Ok(slots) => slots,
        Err(e) => return ClassificationResult::error(utterance, e),
    };

    // Per-slot failures drop the slot and trace the reason; the result
    // itself stays successful so other slots survive.
    let mut slots = HashMap::new();
    let mut call_context = HashMap::new();
    for (name, raw_value) in raw_slots {
        let Some(slot_meta) = intent.slot(&name) else {
            context.trace_warn(&format!(
                "Model tagged undeclared slot {} for intent {}",
                name, intent.name
            ));
            continue;
        };
        let parser = match registry.resolve(&slot_meta.slot_type) {
            Ok(parser) => parser,
            Err(e) => {
                context.trace_error(&format!("Slot {} dropped: {}", name, e));
                continue;
            }
        };
        match parser.parse(slot_meta, &raw_value, &mut call_context) {
            Ok(value) => {
                let slot = Slot {
                    name: name.clone(),
                    slot_type: slot_meta.slot_type.clone(),
                    raw_value,
                    value,
                };
                slots.insert(name, slot);
            }
            Err(e) => {
                context.trace_error(&format!(
                    "Slot {} dropped: {}",
                    name,
                    NluError::Parse(e.to_string())
                ));
            }
        }
    }

    ClassificationResult {
        utterance: utterance.to_string(),
        intent: Some(intent.name.clone()),
        confidence,
        slots,
        context: call_context,
        error: None,
    }
}
