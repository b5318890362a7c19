//! Client side of the watermelon analysis service: pick an image, preview
//! it, send it to `/predict` and present the classification.

pub mod i18n;
pub mod predict;
pub mod session;
pub mod settings;
pub mod upload;
pub mod worker;

pub use i18n::{Language, LanguagePreference};
pub use predict::{
    Classifier, HttpClassifier, PredictError, PredictReply, Prediction, format_confidence,
    parse_reply,
};
pub use session::{ResultView, Session, SubmitControl, SubmitState};
pub use settings::{Settings, SettingsError};
pub use upload::{DecodedImage, Preview, SelectedFile, UploadError};
pub use worker::{ImageRequest, WorkerEvent, Workers};
