//! Page state of the analysis screen: selection, preview, submit control,
//! result section and pending alerts.

use crate::i18n::Language;
use crate::predict::{PredictError, PredictReply, Prediction, format_confidence};
use crate::upload::{DecodedImage, Preview, SelectedFile, UploadError};
use crate::worker::{ImageRequest, WorkerEvent};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
}

/// What the submit button shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitControl {
    pub enabled: bool,
    pub label: &'static str,
}

/// Contents of the result section.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub label: String,
    pub confidence_text: String,
    pub details: String,
    pub image_path: String,
    /// Annotated image, once downloaded.
    pub image: Option<DecodedImage>,
}

impl From<Prediction> for ResultView {
    fn from(p: Prediction) -> Self {
        Self {
            confidence_text: format_confidence(p.confidence),
            label: p.label,
            details: p.details,
            image_path: p.image_path,
            image: None,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    language: Language,
    selected: Option<SelectedFile>,
    /// Bumped on every accepted selection; stale previews are dropped.
    generation: u64,
    preview: Option<Preview>,
    state: SubmitState,
    result: Option<ResultView>,
    result_seq: u64,
    alerts: VecDeque<String>,
}

impl Session {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            selected: None,
            generation: 0,
            preview: None,
            state: SubmitState::Idle,
            result: None,
            result_seq: 0,
            alerts: VecDeque::new(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// `Some` while the result section is visible.
    pub fn result(&self) -> Option<&ResultView> {
        self.result.as_ref()
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn submit(&self) -> SubmitControl {
        match self.state {
            SubmitState::Idle => SubmitControl {
                enabled: self.selected.is_some(),
                label: self.language.submit_label(),
            },
            SubmitState::Submitting => SubmitControl {
                enabled: false,
                label: self.language.submitting_label(),
            },
        }
    }

    pub fn current_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }

    /// Accepts a picked file when its declared type is an image.
    ///
    /// Returns the generation to tag the preview read with. A rejected file
    /// raises an alert and leaves every other piece of state untouched.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<u64, UploadError> {
        if !file.is_image() {
            tracing::warn!(file = %file.name, mime = %file.mime, "rejected non-image selection");
            self.alert(self.language.not_an_image());
            return Err(UploadError::NotAnImage { mime: file.mime });
        }
        tracing::info!(file = %file.name, mime = %file.mime, "file selected");
        self.generation += 1;
        self.selected = Some(file);
        Ok(self.generation)
    }

    pub fn preview_loaded(&mut self, generation: u64, preview: Preview) {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "dropping stale preview");
            return;
        }
        self.preview = Some(preview);
        self.result = None;
    }

    pub fn preview_failed(&mut self, generation: u64, err: &UploadError) {
        if generation != self.generation {
            return;
        }
        tracing::warn!("preview failed: {err}");
        self.preview = None;
        self.alert(self.language.preview_failed());
    }

    /// Moves the control to `Submitting` and hands out the file to send.
    /// `None` when the control is disabled.
    pub fn begin_submit(&mut self) -> Option<SelectedFile> {
        if !self.submit().enabled {
            return None;
        }
        let file = self.selected.clone()?;
        tracing::info!(file = %file.name, "submitting for prediction");
        self.state = SubmitState::Submitting;
        Some(file)
    }

    /// Applies the outcome of a prediction and returns the control to
    /// `Idle` on every path.
    ///
    /// On success the returned request names the annotated image to fetch.
    pub fn finish_submit(
        &mut self,
        outcome: Result<PredictReply, PredictError>,
    ) -> Option<ImageRequest> {
        if self.state != SubmitState::Submitting {
            tracing::warn!("prediction finished while no submission was pending");
        }
        self.state = SubmitState::Idle;

        match outcome {
            Ok(PredictReply::Prediction(prediction)) => {
                tracing::info!(
                    label = %prediction.label,
                    confidence = prediction.confidence,
                    "prediction received"
                );
                self.result_seq += 1;
                let request = ImageRequest {
                    seq: self.result_seq,
                    image_path: prediction.image_path.clone(),
                };
                self.result = Some(ResultView::from(prediction));
                Some(request)
            }
            Ok(PredictReply::Rejected(message)) => {
                tracing::warn!(%message, "server rejected the image");
                self.alert(message);
                None
            }
            Err(err) => {
                tracing::warn!("prediction failed: {err}");
                self.alert(self.language.processing_failed());
                None
            }
        }
    }

    pub fn result_image_loaded(&mut self, seq: u64, image: DecodedImage) {
        if seq != self.result_seq {
            return;
        }
        if let Some(result) = self.result.as_mut() {
            result.image = Some(image);
        }
    }

    pub fn result_image_failed(&mut self, seq: u64, err: &PredictError) {
        if seq == self.result_seq {
            tracing::warn!("result image unavailable: {err}");
        }
    }

    /// Routes a worker event to the matching transition.
    pub fn handle(&mut self, event: WorkerEvent) -> Option<ImageRequest> {
        match event {
            WorkerEvent::PreviewReady { generation, result } => {
                match result {
                    Ok(preview) => self.preview_loaded(generation, preview),
                    Err(err) => self.preview_failed(generation, &err),
                }
                None
            }
            WorkerEvent::PredictDone(outcome) => self.finish_submit(outcome),
            WorkerEvent::ResultImageReady { seq, result } => {
                match result {
                    Ok(image) => self.result_image_loaded(seq, image),
                    Err(err) => self.result_image_failed(seq, &err),
                }
                None
            }
        }
    }

    fn alert(&mut self, message: impl Into<String>) {
        self.alerts.push_back(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{DecodedImage, png_bytes, to_data_url};
    use rstest::{fixture, rstest};

    #[fixture]
    fn session() -> Session {
        Session::new(Language::Indonesian)
    }

    fn preview_of(name: &str) -> Preview {
        Preview {
            file_name: name.to_string(),
            data_url: to_data_url("image/png", &png_bytes(1, 1)),
            image: Some(DecodedImage {
                width: 1,
                height: 1,
                rgba: vec![0, 0, 0, 255],
            }),
        }
    }

    fn prediction() -> Prediction {
        Prediction {
            label: "Sehat".into(),
            confidence: 0.8734,
            details: "Semangka matang".into(),
            image_path: "/static/out.png".into(),
        }
    }

    fn submitted(mut session: Session) -> Session {
        session
            .select_file(SelectedFile::from_path("cat.png"))
            .expect("image accepted");
        session.begin_submit().expect("control enabled");
        session
    }

    #[rstest]
    fn starts_idle_disabled_without_result(session: Session) {
        assert_eq!(
            session.submit(),
            SubmitControl {
                enabled: false,
                label: "Analisis Semangka"
            }
        );
        assert!(session.result().is_none());
        assert!(session.preview().is_none());
    }

    #[rstest]
    #[case("notes.txt")]
    #[case("report.pdf")]
    #[case("no_extension")]
    fn non_image_selection_alerts_and_changes_nothing(mut session: Session, #[case] name: &str) {
        let err = session.select_file(SelectedFile::from_path(name));
        assert!(matches!(err, Err(UploadError::NotAnImage { .. })));
        assert!(!session.submit().enabled);
        assert!(session.preview().is_none());
        assert!(session.selected().is_none());
        assert_eq!(session.current_alert(), Some("Mohon pilih file gambar"));
    }

    #[rstest]
    fn non_image_after_image_keeps_previous_selection(mut session: Session) {
        let generation = session
            .select_file(SelectedFile::from_path("cat.png"))
            .expect("image accepted");
        session.preview_loaded(generation, preview_of("cat.png"));
        let _ = session.select_file(SelectedFile::from_path("notes.txt"));
        assert_eq!(session.selected().map(|f| f.name.as_str()), Some("cat.png"));
        assert!(session.submit().enabled);
        assert_eq!(session.preview().map(|p| p.file_name.as_str()), Some("cat.png"));
    }

    #[rstest]
    #[case("cat.png")]
    #[case("melon.JPG")]
    #[case("anim.gif")]
    fn image_selection_enables_submit_and_shows_preview(mut session: Session, #[case] name: &str) {
        let generation = session
            .select_file(SelectedFile::from_path(name))
            .expect("image accepted");
        assert!(session.submit().enabled);
        session.preview_loaded(generation, preview_of(name));
        assert_eq!(session.preview().map(|p| p.file_name.as_str()), Some(name));
        assert!(session.current_alert().is_none());
    }

    #[rstest]
    fn stale_preview_is_ignored(mut session: Session) {
        let first = session
            .select_file(SelectedFile::from_path("a.png"))
            .expect("image accepted");
        let second = session
            .select_file(SelectedFile::from_path("b.png"))
            .expect("image accepted");
        session.preview_loaded(second, preview_of("b.png"));
        session.preview_loaded(first, preview_of("a.png"));
        assert_eq!(session.preview().map(|p| p.file_name.as_str()), Some("b.png"));
    }

    #[rstest]
    fn new_preview_hides_previous_result(session: Session) {
        let mut session = submitted(session);
        session.finish_submit(Ok(PredictReply::Prediction(prediction())));
        assert!(session.result().is_some());

        let generation = session
            .select_file(SelectedFile::from_path("melon.png"))
            .expect("image accepted");
        session.preview_loaded(generation, preview_of("melon.png"));
        assert!(session.result().is_none());
    }

    #[rstest]
    fn preview_failure_alerts(mut session: Session) {
        let generation = session
            .select_file(SelectedFile::from_path("cat.png"))
            .expect("image accepted");
        let err = UploadError::Read {
            path: "cat.png".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        session.preview_failed(generation, &err);
        assert_eq!(
            session.current_alert(),
            Some("Gambar tidak dapat dibaca untuk pratinjau.")
        );
    }

    #[rstest]
    fn unreadable_file_clears_previous_preview(mut session: Session) {
        let first = session
            .select_file(SelectedFile::from_path("a.png"))
            .expect("image accepted");
        session.preview_loaded(first, preview_of("a.png"));
        let second = session
            .select_file(SelectedFile::from_path("b.png"))
            .expect("image accepted");
        let err = UploadError::Read {
            path: "b.png".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        session.preview_failed(second, &err);
        assert!(session.preview().is_none());
        assert_eq!(session.selected().map(|f| f.name.as_str()), Some("b.png"));
    }

    #[rstest]
    #[case("b.svg", &b"<svg xmlns='http://www.w3.org/2000/svg'/>"[..])]
    #[case("b.png", &b"\x89PNG truncated"[..])]
    fn undecodable_image_replaces_previous_preview(
        mut session: Session,
        #[case] name: &str,
        #[case] bytes: &[u8],
    ) {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = session
            .select_file(SelectedFile::from_path("a.png"))
            .expect("image accepted");
        session.preview_loaded(first, preview_of("a.png"));

        let path = dir.path().join(name);
        std::fs::write(&path, bytes).expect("write");
        let file = SelectedFile::from_path(&path);
        let second = session.select_file(file.clone()).expect("image accepted");
        match crate::upload::read_preview(&file) {
            Ok(preview) => session.preview_loaded(second, preview),
            Err(err) => session.preview_failed(second, &err),
        }

        let preview = session.preview().expect("preview visible");
        assert_eq!(preview.file_name, name);
        assert!(preview.image.is_none());
        assert_eq!(session.selected().map(|f| f.name.as_str()), Some(name));
        assert!(session.submit().enabled);
        assert!(session.current_alert().is_none());
    }

    #[rstest]
    fn submitting_disables_control_with_progress_label(session: Session) {
        let session = submitted(session);
        assert_eq!(session.state(), SubmitState::Submitting);
        assert_eq!(
            session.submit(),
            SubmitControl {
                enabled: false,
                label: "Menganalisis..."
            }
        );
    }

    #[rstest]
    fn begin_submit_requires_enabled_control(mut session: Session) {
        assert!(session.begin_submit().is_none());
        let mut session = submitted(session);
        assert!(session.begin_submit().is_none(), "second submit while in flight");
    }

    #[rstest]
    fn selecting_during_submission_keeps_control_disabled(session: Session) {
        let mut session = submitted(session);
        session
            .select_file(SelectedFile::from_path("melon.png"))
            .expect("image accepted");
        assert!(!session.submit().enabled);
        session.finish_submit(Err(PredictError::Interrupted));
        assert!(session.submit().enabled);
    }

    #[rstest]
    fn success_fills_result_and_restores_control(session: Session) {
        let mut session = submitted(session);
        let request = session.finish_submit(Ok(PredictReply::Prediction(prediction())));

        assert_eq!(
            request,
            Some(ImageRequest {
                seq: 1,
                image_path: "/static/out.png".into()
            })
        );
        let result = session.result().expect("result visible");
        assert_eq!(result.label, "Sehat");
        assert_eq!(result.confidence_text, "87.34%");
        assert_eq!(result.details, "Semangka matang");
        assert_eq!(result.image_path, "/static/out.png");
        assert_eq!(
            session.submit(),
            SubmitControl {
                enabled: true,
                label: "Analisis Semangka"
            }
        );
    }

    #[rstest]
    fn rejection_alerts_and_keeps_result_hidden(session: Session) {
        let mut session = submitted(session);
        let request = session.finish_submit(Ok(PredictReply::Rejected(
            "Invalid file format. Only PNG, JPG, and JPEG are allowed.".into(),
        )));
        assert!(request.is_none());
        assert!(session.result().is_none());
        assert_eq!(
            session.current_alert(),
            Some("Invalid file format. Only PNG, JPG, and JPEG are allowed.")
        );
        assert_eq!(
            session.submit(),
            SubmitControl {
                enabled: true,
                label: "Analisis Semangka"
            }
        );
    }

    #[rstest]
    #[case(PredictError::Interrupted)]
    #[case(PredictError::Decode(serde_json::from_str::<serde_json::Value>("<html>").unwrap_err()))]
    fn failure_alerts_generic_message_and_restores_control(
        session: Session,
        #[case] err: PredictError,
    ) {
        let mut session = submitted(session);
        assert!(session.finish_submit(Err(err)).is_none());
        assert!(session.result().is_none());
        assert_eq!(
            session.current_alert(),
            Some("Error dalam memproses gambar. Silakan coba lagi.")
        );
        assert_eq!(session.state(), SubmitState::Idle);
        assert!(session.submit().enabled);
        assert_eq!(session.submit().label, "Analisis Semangka");
    }

    #[rstest]
    fn alerts_queue_in_order(mut session: Session) {
        let _ = session.select_file(SelectedFile::from_path("a.txt"));
        let _ = session.select_file(SelectedFile::from_path("b.txt"));
        session.set_language(Language::English);
        let _ = session.select_file(SelectedFile::from_path("c.txt"));

        assert_eq!(session.current_alert(), Some("Mohon pilih file gambar"));
        session.dismiss_alert();
        assert_eq!(session.current_alert(), Some("Mohon pilih file gambar"));
        session.dismiss_alert();
        assert_eq!(session.current_alert(), Some("Please choose an image file"));
        session.dismiss_alert();
        assert!(session.current_alert().is_none());
    }

    #[rstest]
    fn result_image_attaches_only_to_current_result(session: Session) {
        let mut session = submitted(session);
        let first = session
            .finish_submit(Ok(PredictReply::Prediction(prediction())))
            .expect("image request");
        session.begin_submit().expect("control enabled");
        let second = session
            .finish_submit(Ok(PredictReply::Prediction(prediction())))
            .expect("image request");

        let image = DecodedImage {
            width: 1,
            height: 1,
            rgba: vec![1, 2, 3, 4],
        };
        session.result_image_loaded(first.seq, image.clone());
        assert!(session.result().and_then(|r| r.image.as_ref()).is_none());
        session.result_image_loaded(second.seq, image.clone());
        assert_eq!(session.result().and_then(|r| r.image.clone()), Some(image));
    }

    #[rstest]
    fn handle_routes_predict_events(session: Session) {
        let mut session = submitted(session);
        let request = session.handle(WorkerEvent::PredictDone(Ok(PredictReply::Prediction(
            prediction(),
        ))));
        assert!(request.is_some());
        assert!(session.result().is_some());
        assert!(session.submit().enabled);
    }
}
