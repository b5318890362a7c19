//! Background threads for the two blocking steps: reading the preview and
//! the prediction round trip. Results come back to the UI thread as
//! [`WorkerEvent`]s over a channel.

use crate::predict::{Classifier, PredictError, PredictReply};
use crate::upload::{self, DecodedImage, Preview, SelectedFile, UploadError};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

pub enum WorkerEvent {
    PreviewReady {
        generation: u64,
        result: Result<Preview, UploadError>,
    },
    PredictDone(Result<PredictReply, PredictError>),
    ResultImageReady {
        seq: u64,
        result: Result<DecodedImage, PredictError>,
    },
}

/// Download of an annotated result image, tagged with the result it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub seq: u64,
    pub image_path: String,
}

type Notify = Arc<dyn Fn() + Send + Sync>;

pub struct Workers {
    tx: Sender<WorkerEvent>,
    rx: Receiver<WorkerEvent>,
    notify: Notify,
}

impl Workers {
    /// `notify` runs after every event is queued, e.g. to wake the UI.
    pub fn new(notify: impl Fn() + Send + Sync + 'static) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            notify: Arc::new(notify),
        }
    }

    pub fn spawn_preview(&self, generation: u64, file: SelectedFile) {
        let tx = self.tx.clone();
        let notify = self.notify.clone();
        spawn_named("preview", move || {
            let result = upload::read_preview(&file);
            if tx.send(WorkerEvent::PreviewReady { generation, result }).is_ok() {
                notify();
            }
        });
    }

    /// Runs one prediction. Exactly one [`WorkerEvent::PredictDone`] is
    /// delivered, even when the classifier panics.
    pub fn spawn_predict(&self, classifier: Arc<dyn Classifier>, file: SelectedFile) {
        let completion = Completion {
            tx: self.tx.clone(),
            notify: self.notify.clone(),
            sent: false,
        };
        spawn_named("predict", move || {
            let outcome = classifier.predict(&file);
            completion.send(outcome);
        });
    }

    pub fn spawn_result_image(&self, classifier: Arc<dyn Classifier>, request: ImageRequest) {
        let tx = self.tx.clone();
        let notify = self.notify.clone();
        spawn_named("result-image", move || {
            let result = classifier
                .fetch_image(&request.image_path)
                .and_then(|bytes| upload::decode_image(&bytes).map_err(PredictError::from));
            let event = WorkerEvent::ResultImageReady {
                seq: request.seq,
                result,
            };
            if tx.send(event).is_ok() {
                notify();
            }
        });
    }

    pub fn try_recv(&self) -> Option<WorkerEvent> {
        self.rx.try_recv().ok()
    }

    /// Blocks until the next event.
    pub fn recv(&self) -> Option<WorkerEvent> {
        self.rx.recv().ok()
    }
}

fn spawn_named(name: &str, job: impl FnOnce() + Send + 'static) {
    if let Err(e) = thread::Builder::new().name(name.to_string()).spawn(job) {
        tracing::error!(worker = name, "failed to spawn worker thread: {e}");
    }
}

struct Completion {
    tx: Sender<WorkerEvent>,
    notify: Notify,
    sent: bool,
}

impl Completion {
    fn send(mut self, outcome: Result<PredictReply, PredictError>) {
        self.sent = true;
        self.deliver(outcome);
    }

    fn deliver(&self, outcome: Result<PredictReply, PredictError>) {
        if self.tx.send(WorkerEvent::PredictDone(outcome)).is_ok() {
            (self.notify)();
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.sent {
            tracing::warn!("predict worker ended without a result");
            self.deliver(Err(PredictError::Interrupted));
        }
    }
}
