use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::analysis::{AnalysisReport, Clause};
use crate::assistant::{ChatSession, VoiceState, COMMON_QUESTIONS};
use crate::config::Config;
use crate::document::{self, DocumentKind, FileBrowser, UploadError, UploadedDocument};
use crate::profile::{AuthMode, AuthRequest, Language, UserProfile, INDIAN_STATES};
use crate::services::{ChatScope, ServiceError, Services, TurnContext};
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Upload,
    Qa,
    Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Focusable fields on the auth form. Sign-in shows phone, password, and the
/// terms checkbox; sign-up cycles through everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Name,
    Email,
    Phone,
    Password,
    Language,
    State,
    Terms,
}

impl AuthField {
    pub fn next(self, mode: AuthMode) -> Self {
        match mode {
            AuthMode::SignIn => match self {
                AuthField::Phone => AuthField::Password,
                AuthField::Password => AuthField::Terms,
                _ => AuthField::Phone,
            },
            AuthMode::SignUp => match self {
                AuthField::Name => AuthField::Email,
                AuthField::Email => AuthField::Phone,
                AuthField::Phone => AuthField::Password,
                AuthField::Password => AuthField::Language,
                AuthField::Language => AuthField::State,
                AuthField::State => AuthField::Terms,
                AuthField::Terms => AuthField::Name,
            },
        }
    }

    pub fn prev(self, mode: AuthMode) -> Self {
        match mode {
            AuthMode::SignIn => match self {
                AuthField::Password => AuthField::Phone,
                AuthField::Terms => AuthField::Password,
                _ => AuthField::Terms,
            },
            AuthMode::SignUp => match self {
                AuthField::Name => AuthField::Terms,
                AuthField::Email => AuthField::Name,
                AuthField::Phone => AuthField::Email,
                AuthField::Password => AuthField::Phone,
                AuthField::Language => AuthField::Password,
                AuthField::State => AuthField::Language,
                AuthField::Terms => AuthField::State,
            },
        }
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            AuthField::Name | AuthField::Email | AuthField::Phone | AuthField::Password
        )
    }
}

/// Panes on the analysis screen once a report is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPane {
    Clauses,
    Guidance,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidanceTab {
    NextSteps,
    Negotiation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QaPane {
    Chat,
    Questions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// Transient notice drawn over the top-right corner of the screen.
#[derive(Debug, Clone)]
pub struct Toast {
    pub title: String,
    pub body: String,
    pub kind: ToastKind,
    pub ticks_left: u8,
}

/// How many animation ticks a toast stays visible (ticks fire every 300ms).
pub const TOAST_TICKS: u8 = 13;

/// A validated file waiting for the user to confirm the upload.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub path: PathBuf,
    pub name: String,
    pub kind: DocumentKind,
    pub size_bytes: u64,
}

/// Simulated transfer time before a confirmed file is read off disk.
pub const UPLOAD_LATENCY: Duration = Duration::from_secs(2);

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Signed-in user; None means the auth gate is showing
    pub session: Option<UserProfile>,

    // Auth form state
    pub auth_mode: AuthMode,
    pub auth_field: AuthField,
    pub auth_name: String,
    pub auth_email: String,
    pub auth_phone: String,
    pub auth_password: String,
    pub auth_language: Language,
    pub auth_state_idx: Option<usize>,
    pub auth_terms: bool,
    pub auth_cursor: usize,
    pub auth_pending: bool,
    pub auth_task: Option<JoinHandle<()>>,

    // Picker popups (shared by the auth form and the analysis screen)
    pub show_language_picker: bool,
    pub language_picker_state: ListState,
    pub show_state_picker: bool,
    pub state_picker_state: ListState,

    // Home state
    pub home_card: usize,

    // Upload state
    pub browser: FileBrowser,
    pub browser_state: ListState,
    pub pending_file: Option<PendingFile>,
    pub uploading: bool,
    pub upload_gen: u64,
    pub upload_task: Option<JoinHandle<()>>,
    pub upload_latency: Duration,

    // Analysis state
    pub document: Option<UploadedDocument>,
    pub analyzing: bool,
    pub analysis_gen: u64,
    pub analysis_task: Option<JoinHandle<()>>,
    pub report: Option<AnalysisReport>,
    pub clause_state: ListState,
    pub selected_clause: Option<usize>,
    pub analysis_pane: AnalysisPane,
    pub guidance_tab: GuidanceTab,

    // Document chat (analysis screen sidebar)
    pub doc_chat: ChatSession,
    pub doc_input: String,
    pub doc_cursor: usize,
    pub doc_chat_scroll: u16,
    pub doc_chat_height: u16,
    pub doc_chat_width: u16,

    // Q&A screen state
    pub qa_chat: ChatSession,
    pub qa_pane: QaPane,
    pub qa_input: String,
    pub qa_cursor: usize,
    pub qa_scroll: u16,
    pub qa_chat_height: u16,
    pub qa_chat_width: u16,
    pub question_state: ListState,

    // Voice capture state
    pub voice: VoiceState,
    pub voice_gen: u64,
    pub voice_task: Option<JoinHandle<()>>,

    // Reply workers for both chats, plus the last chat failure
    pub chat_tasks: Vec<JoinHandle<()>>,
    pub chat_notice: Option<String>,

    // Toasts, oldest first
    pub toasts: VecDeque<Toast>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Interface language shown in the header; persisted on change
    pub language: Language,

    // Panel areas for mouse hit-testing (updated during render)
    pub browser_area: Option<Rect>,
    pub clause_area: Option<Rect>,
    pub doc_chat_area: Option<Rect>,
    pub qa_chat_area: Option<Rect>,
    pub question_area: Option<Rect>,

    // Wiring
    pub config: Config,
    pub services: Services,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        config: Config,
        services: Services,
        events: UnboundedSender<AppEvent>,
    ) -> anyhow::Result<Self> {
        let start_dir = config.start_dir.clone().unwrap_or_else(|| ".".to_string());
        let browser = FileBrowser::open(start_dir)?;
        let mut browser_state = ListState::default();
        if !browser.entries.is_empty() {
            browser_state.select(Some(0));
        }

        let language = config
            .preferred_language
            .as_deref()
            .and_then(Language::from_code)
            .unwrap_or_default();

        let mut question_state = ListState::default();
        question_state.select(Some(0));

        Ok(Self {
            should_quit: false,
            screen: Screen::Home,
            input_mode: InputMode::Normal,

            session: None,

            auth_mode: AuthMode::SignIn,
            auth_field: AuthField::Phone,
            auth_name: String::new(),
            auth_email: String::new(),
            auth_phone: String::new(),
            auth_password: String::new(),
            auth_language: language,
            auth_state_idx: None,
            auth_terms: false,
            auth_cursor: 0,
            auth_pending: false,
            auth_task: None,

            show_language_picker: false,
            language_picker_state: ListState::default(),
            show_state_picker: false,
            state_picker_state: ListState::default(),

            home_card: 0,

            browser,
            browser_state,
            pending_file: None,
            uploading: false,
            upload_gen: 0,
            upload_task: None,
            upload_latency: UPLOAD_LATENCY,

            document: None,
            analyzing: false,
            analysis_gen: 0,
            analysis_task: None,
            report: None,
            clause_state: ListState::default(),
            selected_clause: None,
            analysis_pane: AnalysisPane::Clauses,
            guidance_tab: GuidanceTab::NextSteps,

            doc_chat: ChatSession::new(),
            doc_input: String::new(),
            doc_cursor: 0,
            doc_chat_scroll: 0,
            doc_chat_height: 0,
            doc_chat_width: 0,

            qa_chat: ChatSession::new(),
            qa_pane: QaPane::Chat,
            qa_input: String::new(),
            qa_cursor: 0,
            qa_scroll: 0,
            qa_chat_height: 0,
            qa_chat_width: 0,
            question_state,

            voice: VoiceState::Idle,
            voice_gen: 0,
            voice_task: None,

            chat_tasks: Vec::new(),
            chat_notice: None,

            toasts: VecDeque::new(),

            animation_frame: 0,

            language,

            browser_area: None,
            clause_area: None,
            doc_chat_area: None,
            qa_chat_area: None,
            question_area: None,

            config,
            services,
            events,
        })
    }

    // ---- Auth form ----

    /// Switch between sign-in and sign-up, keeping whatever was typed.
    pub fn toggle_auth_mode(&mut self) {
        self.auth_mode = match self.auth_mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
        self.auth_field = match self.auth_mode {
            AuthMode::SignIn => AuthField::Phone,
            AuthMode::SignUp => AuthField::Name,
        };
        self.sync_auth_cursor();
    }

    pub fn auth_next_field(&mut self) {
        self.auth_field = self.auth_field.next(self.auth_mode);
        self.sync_auth_cursor();
    }

    pub fn auth_prev_field(&mut self) {
        self.auth_field = self.auth_field.prev(self.auth_mode);
        self.sync_auth_cursor();
    }

    pub fn auth_field_value(&self) -> &str {
        match self.auth_field {
            AuthField::Name => &self.auth_name,
            AuthField::Email => &self.auth_email,
            AuthField::Phone => &self.auth_phone,
            AuthField::Password => &self.auth_password,
            _ => "",
        }
    }

    pub fn auth_field_value_mut(&mut self) -> Option<&mut String> {
        match self.auth_field {
            AuthField::Name => Some(&mut self.auth_name),
            AuthField::Email => Some(&mut self.auth_email),
            AuthField::Phone => Some(&mut self.auth_phone),
            AuthField::Password => Some(&mut self.auth_password),
            _ => None,
        }
    }

    /// Move the cursor to the end of the newly focused field.
    fn sync_auth_cursor(&mut self) {
        self.auth_cursor = self.auth_field_value().chars().count();
    }

    fn auth_request(&self) -> AuthRequest {
        match self.auth_mode {
            AuthMode::SignIn => AuthRequest {
                mode: AuthMode::SignIn,
                name: None,
                phone: self.auth_phone.trim().to_string(),
                email: None,
                password: self.auth_password.clone(),
                preferred_language: self.auth_language,
                state: None,
            },
            AuthMode::SignUp => AuthRequest {
                mode: AuthMode::SignUp,
                name: Some(self.auth_name.trim().to_string()).filter(|n| !n.is_empty()),
                phone: self.auth_phone.trim().to_string(),
                email: Some(self.auth_email.trim().to_string()).filter(|e| !e.is_empty()),
                password: self.auth_password.clone(),
                preferred_language: self.auth_language,
                state: self
                    .auth_state_idx
                    .and_then(|i| INDIAN_STATES.get(i))
                    .map(|s| s.to_string()),
            },
        }
    }

    /// Run local validation, then hand the form to the authenticator.
    pub fn submit_auth(&mut self) {
        if self.auth_pending {
            return;
        }
        let request = self.auth_request();
        if let Err(message) = request.validate() {
            self.push_toast("Invalid Details", &message, ToastKind::Error);
            return;
        }
        if !self.auth_terms {
            self.push_toast(
                "Terms Required",
                "Please accept the terms and conditions to continue.",
                ToastKind::Error,
            );
            return;
        }

        self.auth_pending = true;
        let auth = self.services.auth.clone();
        let tx = self.events.clone();
        self.auth_task = Some(tokio::spawn(async move {
            let result = auth.sign_in(&request).await;
            let _ = tx.send(AppEvent::Auth(result));
        }));
    }

    pub fn on_auth(&mut self, result: Result<UserProfile, ServiceError>) {
        self.auth_pending = false;
        self.auth_task = None;
        match result {
            Ok(profile) => {
                let body = match self.auth_mode {
                    AuthMode::SignIn => "Successfully signed in. Redirecting to dashboard...",
                    AuthMode::SignUp => "Successfully registered. Redirecting to dashboard...",
                };
                self.push_toast("Welcome!", body, ToastKind::Success);
                self.language = profile.preferred_language;
                let _ = Config::save_preferred_language(profile.preferred_language.code());
                self.session = Some(profile);
                self.auth_password.clear();
                self.screen = Screen::Home;
                self.home_card = 0;
            }
            Err(err) => {
                let title = match self.auth_mode {
                    AuthMode::SignIn => "Sign In Failed",
                    AuthMode::SignUp => "Registration Failed",
                };
                self.push_toast(title, &err.to_string(), ToastKind::Error);
            }
        }
    }

    pub fn logout(&mut self) {
        self.cancel_background_work();
        if let Some(task) = self.auth_task.take() {
            task.abort();
        }
        self.session = None;
        self.auth_pending = false;
        self.auth_mode = AuthMode::SignIn;
        self.auth_field = AuthField::Phone;
        self.auth_name.clear();
        self.auth_email.clear();
        self.auth_phone.clear();
        self.auth_password.clear();
        self.auth_terms = false;
        self.auth_state_idx = None;
        self.auth_cursor = 0;
        self.screen = Screen::Home;
        self.input_mode = InputMode::Normal;
        self.document = None;
        self.report = None;
        self.analyzing = false;
        self.uploading = false;
        self.pending_file = None;
        self.qa_chat.reset();
        self.doc_chat.reset();
        self.qa_input.clear();
        self.qa_cursor = 0;
        self.doc_input.clear();
        self.doc_cursor = 0;
        self.chat_notice = None;
        self.voice = VoiceState::Idle;
        self.toasts.clear();
    }

    // ---- Navigation between screens ----

    /// Return to the dashboard, cancelling whatever was in flight.
    pub fn go_home(&mut self) {
        self.cancel_background_work();
        self.screen = Screen::Home;
        self.input_mode = InputMode::Normal;
        self.home_card = 0;
        self.pending_file = None;
        self.uploading = false;
        self.analyzing = false;
        self.document = None;
        self.report = None;
        self.selected_clause = None;
        self.clause_state.select(None);
        self.doc_chat.reset();
        self.doc_input.clear();
        self.doc_cursor = 0;
        self.doc_chat_scroll = 0;
        self.qa_chat.reset();
        self.qa_input.clear();
        self.qa_cursor = 0;
        self.qa_scroll = 0;
        self.chat_notice = None;
        self.voice = VoiceState::Idle;
    }

    pub fn go_upload(&mut self) {
        self.screen = Screen::Upload;
        self.input_mode = InputMode::Normal;
        self.pending_file = None;
        self.uploading = false;
        let _ = self.browser.refresh();
        let len = self.browser.entries.len();
        if len == 0 {
            self.browser_state.select(None);
        } else {
            let i = self.browser_state.selected().unwrap_or(0);
            self.browser_state.select(Some(i.min(len - 1)));
        }
    }

    /// Leave the upload screen: back to the open report when one exists,
    /// otherwise to the dashboard.
    pub fn back_from_upload(&mut self) {
        if self.report.is_some() {
            self.pending_file = None;
            self.screen = Screen::Analysis;
            self.input_mode = InputMode::Normal;
        } else {
            self.go_home();
        }
    }

    /// Open the Q&A screen with a fresh conversation and a greeting.
    pub fn go_qa(&mut self) {
        if let Some(task) = self.voice_task.take() {
            task.abort();
        }
        self.voice_gen += 1;
        self.voice = VoiceState::Idle;
        self.screen = Screen::Qa;
        self.qa_pane = QaPane::Chat;
        self.input_mode = InputMode::Editing;
        self.qa_chat.reset();
        self.qa_chat
            .seed_greeting(self.session.as_ref().map(|p| p.first_name()));
        self.qa_input.clear();
        self.qa_cursor = 0;
        self.qa_scroll = 0;
        self.question_state.select(Some(0));
        self.chat_notice = None;
    }

    fn cancel_background_work(&mut self) {
        if let Some(task) = self.upload_task.take() {
            task.abort();
        }
        if let Some(task) = self.analysis_task.take() {
            task.abort();
        }
        if let Some(task) = self.voice_task.take() {
            task.abort();
        }
        for task in self.chat_tasks.drain(..) {
            task.abort();
        }
        // Bump every generation so completions already in the channel are dropped
        self.upload_gen += 1;
        self.analysis_gen += 1;
        self.voice_gen += 1;
    }

    // ---- Home ----

    pub fn home_next_card(&mut self) {
        self.home_card = (self.home_card + 1) % 2;
    }

    pub fn activate_home_card(&mut self) {
        match self.home_card {
            0 => self.go_upload(),
            _ => self.go_qa(),
        }
    }

    // ---- Upload screen ----

    pub fn browser_nav_down(&mut self) {
        let len = self.browser.entries.len();
        if len > 0 {
            let i = self.browser_state.selected().unwrap_or(0);
            self.browser_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn browser_nav_up(&mut self) {
        let i = self.browser_state.selected().unwrap_or(0);
        self.browser_state.select(Some(i.saturating_sub(1)));
    }

    pub fn browser_nav_first(&mut self) {
        if !self.browser.entries.is_empty() {
            self.browser_state.select(Some(0));
        }
    }

    pub fn browser_nav_last(&mut self) {
        let len = self.browser.entries.len();
        if len > 0 {
            self.browser_state.select(Some(len - 1));
        }
    }

    /// Enter on a browser row: descend into directories, validate files.
    pub fn choose_entry(&mut self) -> anyhow::Result<()> {
        let Some(idx) = self.browser_state.selected() else {
            return Ok(());
        };
        let Some(entry) = self.browser.entry(idx).cloned() else {
            return Ok(());
        };
        if entry.is_dir {
            self.browser.descend(idx)?;
            self.browser_state
                .select(if self.browser.entries.is_empty() { None } else { Some(0) });
            return Ok(());
        }
        match document::validate(&entry.path, entry.size_bytes) {
            Ok(kind) => {
                self.pending_file = Some(PendingFile {
                    path: entry.path,
                    name: entry.name,
                    kind,
                    size_bytes: entry.size_bytes,
                });
            }
            Err(err) => {
                let title = match err {
                    UploadError::InvalidType => "Invalid File Type",
                    UploadError::TooLarge => "File Too Large",
                };
                self.push_toast(title, &err.to_string(), ToastKind::Error);
            }
        }
        Ok(())
    }

    pub fn browser_ascend(&mut self) -> anyhow::Result<()> {
        if self.browser.ascend()? {
            self.browser_state
                .select(if self.browser.entries.is_empty() { None } else { Some(0) });
        }
        Ok(())
    }

    pub fn remove_pending_file(&mut self) {
        self.pending_file = None;
    }

    /// Confirm the selected file: simulate the transfer, then read it off disk.
    pub fn start_upload(&mut self) {
        if self.uploading {
            return;
        }
        let Some(file) = self.pending_file.clone() else {
            return;
        };
        self.uploading = true;
        self.upload_gen += 1;
        let gen = self.upload_gen;
        let latency = self.upload_latency;
        let tx = self.events.clone();
        self.upload_task = Some(tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            let result = UploadedDocument::read(&file.path, file.kind).await;
            let _ = tx.send(AppEvent::Uploaded { gen, result });
        }));
    }

    pub fn cancel_upload(&mut self) {
        if let Some(task) = self.upload_task.take() {
            task.abort();
        }
        self.upload_gen += 1;
        self.uploading = false;
    }

    pub fn on_uploaded(&mut self, gen: u64, result: anyhow::Result<UploadedDocument>) {
        if gen != self.upload_gen {
            return;
        }
        self.uploading = false;
        self.upload_task = None;
        match result {
            Ok(doc) => {
                self.push_toast(
                    "Document Uploaded Successfully",
                    "Your document is being processed. Please wait...",
                    ToastKind::Success,
                );
                self.pending_file = None;
                self.document_uploaded(doc);
            }
            Err(err) => {
                self.push_toast("Upload Failed", &err.to_string(), ToastKind::Error);
            }
        }
    }

    // ---- Analysis screen ----

    /// Hand a document to the analysis screen and start analyzing it.
    /// Re-sending the document already shown is a no-op, so a duplicate
    /// completion cannot restart a finished analysis.
    pub fn document_uploaded(&mut self, doc: UploadedDocument) {
        if self.screen == Screen::Analysis {
            if let Some(current) = &self.document {
                if current.name == doc.name && current.size_bytes == doc.size_bytes {
                    return;
                }
            }
        }
        if let Some(task) = self.analysis_task.take() {
            task.abort();
        }
        self.analysis_gen += 1;
        self.report = None;
        self.selected_clause = None;
        self.clause_state.select(None);
        self.analysis_pane = AnalysisPane::Clauses;
        self.guidance_tab = GuidanceTab::NextSteps;
        self.doc_chat.reset();
        self.doc_input.clear();
        self.doc_cursor = 0;
        self.doc_chat_scroll = 0;
        self.chat_notice = None;
        self.document = Some(doc);
        self.screen = Screen::Analysis;
        self.input_mode = InputMode::Normal;
        self.analyzing = true;
        self.start_analysis();
    }

    fn start_analysis(&mut self) {
        let Some(doc) = self.document.clone() else {
            return;
        };
        let gen = self.analysis_gen;
        let analyzer = self.services.analyzer.clone();
        let tx = self.events.clone();
        self.analysis_task = Some(tokio::spawn(async move {
            let result = analyzer.analyze(&doc).await;
            let _ = tx.send(AppEvent::Analyzed { gen, result });
        }));
    }

    pub fn on_analyzed(&mut self, gen: u64, result: Result<AnalysisReport, ServiceError>) {
        if gen != self.analysis_gen {
            return;
        }
        self.analyzing = false;
        self.analysis_task = None;
        match result {
            Ok(report) => {
                if !report.clauses.is_empty() {
                    self.clause_state.select(Some(0));
                }
                self.report = Some(report);
                self.push_toast(
                    "Analysis Complete",
                    "Your document has been analyzed. Review the results and recommendations.",
                    ToastKind::Success,
                );
            }
            Err(err) => {
                // Nothing to show; send the user back to pick a file again
                self.document = None;
                self.screen = Screen::Upload;
                self.push_toast("Analysis Failed", &err.to_string(), ToastKind::Error);
            }
        }
    }

    pub fn clause_nav_down(&mut self) {
        let Some(report) = &self.report else { return };
        let len = report.clauses.len();
        if len > 0 {
            let i = self.clause_state.selected().unwrap_or(0);
            let idx = (i + 1).min(len - 1);
            self.clause_state.select(Some(idx));
            self.selected_clause = Some(idx);
        }
    }

    pub fn clause_nav_up(&mut self) {
        if self.report.is_none() {
            return;
        }
        let i = self.clause_state.selected().unwrap_or(0);
        let idx = i.saturating_sub(1);
        self.clause_state.select(Some(idx));
        self.selected_clause = Some(idx);
    }

    pub fn select_clause(&mut self, idx: usize) {
        let Some(report) = &self.report else { return };
        if idx < report.clauses.len() {
            self.clause_state.select(Some(idx));
            self.selected_clause = Some(idx);
        }
    }

    pub fn current_clause(&self) -> Option<&Clause> {
        let report = self.report.as_ref()?;
        self.selected_clause.and_then(|i| report.clauses.get(i))
    }

    pub fn next_analysis_pane(&mut self) {
        self.analysis_pane = match self.analysis_pane {
            AnalysisPane::Clauses => AnalysisPane::Guidance,
            AnalysisPane::Guidance => AnalysisPane::Chat,
            AnalysisPane::Chat => AnalysisPane::Clauses,
        };
        self.input_mode = if self.analysis_pane == AnalysisPane::Chat {
            InputMode::Editing
        } else {
            InputMode::Normal
        };
    }

    pub fn toggle_guidance_tab(&mut self) {
        self.guidance_tab = match self.guidance_tab {
            GuidanceTab::NextSteps => GuidanceTab::Negotiation,
            GuidanceTab::Negotiation => GuidanceTab::NextSteps,
        };
    }

    // ---- Chat ----

    fn spawn_reply(&mut self, scope: ChatScope, question: String, user_id: u64, epoch: u64) {
        let responder = self.services.responder.clone();
        let tx = self.events.clone();
        let task = tokio::spawn(async move {
            let result = responder.respond(TurnContext { question, scope }).await;
            let _ = tx.send(AppEvent::Reply {
                scope,
                epoch,
                user_id,
                result,
            });
        });
        self.chat_tasks.push(task);
    }

    /// Send the Q&A draft as a general legal question.
    pub fn send_qa(&mut self) {
        let question = self.qa_input.trim().to_string();
        if question.is_empty() {
            return;
        }
        self.qa_input.clear();
        self.qa_cursor = 0;
        self.chat_notice = None;
        self.voice = VoiceState::Idle;
        let user_id = self.qa_chat.push_user(question.clone());
        let epoch = self.qa_chat.epoch();
        self.spawn_reply(ChatScope::General, question, user_id, epoch);
        self.scroll_qa_to_bottom();
    }

    /// Send the sidebar draft as a question about the analyzed document.
    pub fn send_doc_chat(&mut self) {
        let question = self.doc_input.trim().to_string();
        if question.is_empty() {
            return;
        }
        self.doc_input.clear();
        self.doc_cursor = 0;
        self.chat_notice = None;
        let user_id = self.doc_chat.push_user(question.clone());
        let epoch = self.doc_chat.epoch();
        self.spawn_reply(ChatScope::Document, question, user_id, epoch);
        self.scroll_doc_chat_to_bottom();
    }

    pub fn on_reply(
        &mut self,
        scope: ChatScope,
        epoch: u64,
        user_id: u64,
        result: Result<crate::assistant::AssistantReply, ServiceError>,
    ) {
        let session = match scope {
            ChatScope::General => &mut self.qa_chat,
            ChatScope::Document => &mut self.doc_chat,
        };
        if epoch != session.epoch() {
            return;
        }
        let failure = match result {
            Ok(reply) => {
                session.apply_reply(user_id, reply);
                None
            }
            Err(err) => {
                session.fail_reply();
                Some(err.to_string())
            }
        };
        if let Some(message) = failure {
            self.chat_notice = Some(message);
        }
        match scope {
            ChatScope::General => self.scroll_qa_to_bottom(),
            ChatScope::Document => self.scroll_doc_chat_to_bottom(),
        }
    }

    // ---- Common questions ----

    pub fn question_nav_down(&mut self) {
        let i = self.question_state.selected().unwrap_or(0);
        self.question_state
            .select(Some((i + 1).min(COMMON_QUESTIONS.len() - 1)));
    }

    pub fn question_nav_up(&mut self) {
        let i = self.question_state.selected().unwrap_or(0);
        self.question_state.select(Some(i.saturating_sub(1)));
    }

    /// Copy the highlighted common question into the draft for editing.
    pub fn use_selected_question(&mut self) {
        if let Some(i) = self.question_state.selected() {
            if let Some(question) = COMMON_QUESTIONS.get(i) {
                self.qa_input = question.to_string();
                self.qa_cursor = self.qa_input.chars().count();
                self.qa_pane = QaPane::Chat;
                self.input_mode = InputMode::Editing;
            }
        }
    }

    // ---- Voice capture ----

    /// Start or stop the simulated voice capture.
    pub fn toggle_voice(&mut self) {
        if self.voice == VoiceState::Listening {
            if let Some(task) = self.voice_task.take() {
                task.abort();
            }
            self.voice_gen += 1;
            self.voice = VoiceState::Idle;
            self.push_toast(
                "Voice Recording Stopped",
                "Recording has been stopped.",
                ToastKind::Info,
            );
            return;
        }
        self.voice = VoiceState::Listening;
        self.voice_gen += 1;
        let gen = self.voice_gen;
        let transcriber = self.services.transcriber.clone();
        let tx = self.events.clone();
        self.voice_task = Some(tokio::spawn(async move {
            let result = transcriber.transcribe().await;
            let _ = tx.send(AppEvent::Transcript { gen, result });
        }));
        self.push_toast(
            "Voice Recording Started",
            "Speak your question clearly. Press v again to stop.",
            ToastKind::Info,
        );
    }

    pub fn on_transcript(&mut self, gen: u64, result: Result<String, ServiceError>) {
        if gen != self.voice_gen {
            return;
        }
        self.voice_task = None;
        match result {
            Ok(transcript) => {
                self.voice = VoiceState::Transcribed;
                self.qa_cursor = transcript.chars().count();
                self.qa_input = transcript;
                self.qa_pane = QaPane::Chat;
                self.input_mode = InputMode::Editing;
                self.push_toast(
                    "Voice Recognized",
                    "Your question has been converted to text. You can edit it before sending.",
                    ToastKind::Success,
                );
            }
            Err(err) => {
                self.voice = VoiceState::Idle;
                self.push_toast("Transcription Failed", &err.to_string(), ToastKind::Error);
            }
        }
    }

    // ---- Language and state pickers ----

    pub fn open_language_picker(&mut self) {
        let current = if self.session.is_none() {
            self.auth_language
        } else {
            self.language
        };
        let idx = Language::all().iter().position(|l| *l == current).unwrap_or(0);
        self.language_picker_state.select(Some(idx));
        self.show_language_picker = true;
    }

    /// Before sign-in the picker edits the form; afterwards it switches the
    /// interface language and persists the choice.
    pub fn apply_language_choice(&mut self, idx: usize) {
        let Some(language) = Language::all().get(idx).copied() else {
            return;
        };
        if self.session.is_none() {
            self.auth_language = language;
        } else {
            self.language = language;
            let _ = Config::save_preferred_language(language.code());
        }
        self.show_language_picker = false;
    }

    pub fn language_picker_nav_down(&mut self) {
        let len = Language::all().len();
        let i = self.language_picker_state.selected().unwrap_or(0);
        self.language_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn language_picker_nav_up(&mut self) {
        let i = self.language_picker_state.selected().unwrap_or(0);
        self.language_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn open_state_picker(&mut self) {
        self.state_picker_state
            .select(Some(self.auth_state_idx.unwrap_or(0)));
        self.show_state_picker = true;
    }

    pub fn apply_state_choice(&mut self, idx: usize) {
        if idx < INDIAN_STATES.len() {
            self.auth_state_idx = Some(idx);
        }
        self.show_state_picker = false;
    }

    pub fn state_picker_nav_down(&mut self) {
        let i = self.state_picker_state.selected().unwrap_or(0);
        self.state_picker_state
            .select(Some((i + 1).min(INDIAN_STATES.len() - 1)));
    }

    pub fn state_picker_nav_up(&mut self) {
        let i = self.state_picker_state.selected().unwrap_or(0);
        self.state_picker_state.select(Some(i.saturating_sub(1)));
    }

    // ---- Toasts and animation ----

    pub fn push_toast(&mut self, title: &str, body: &str, kind: ToastKind) {
        self.toasts.push_back(Toast {
            title: title.to_string(),
            body: body.to_string(),
            kind,
            ticks_left: TOAST_TICKS,
        });
        // Keep the stack shallow; the oldest notice drops first
        while self.toasts.len() > 3 {
            self.toasts.pop_front();
        }
    }

    pub fn dismiss_toast(&mut self) -> bool {
        self.toasts.pop_front().is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.auth_pending
            || self.uploading
            || self.analyzing
            || self.voice == VoiceState::Listening
            || self.qa_chat.pending() > 0
            || self.doc_chat.pending() > 0
    }

    /// Advance animations and expire toasts. Runs on every 300ms tick.
    pub fn tick(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        for toast in self.toasts.iter_mut() {
            toast.ticks_left = toast.ticks_left.saturating_sub(1);
        }
        self.toasts.retain(|t| t.ticks_left > 0);
    }

    // ---- Chat scrolling ----

    pub fn qa_scroll_up(&mut self) {
        self.qa_scroll = self.qa_scroll.saturating_sub(1);
    }

    pub fn qa_scroll_down(&mut self) {
        self.qa_scroll = self.qa_scroll.saturating_add(1);
    }

    pub fn doc_chat_scroll_up(&mut self) {
        self.doc_chat_scroll = self.doc_chat_scroll.saturating_sub(1);
    }

    pub fn doc_chat_scroll_down(&mut self) {
        self.doc_chat_scroll = self.doc_chat_scroll.saturating_add(1);
    }

    /// Scroll the Q&A log so the latest message (or "Thinking...") is visible.
    pub fn scroll_qa_to_bottom(&mut self) {
        let total = chat_total_lines(&self.qa_chat, self.qa_chat_width);
        let visible = if self.qa_chat_height > 0 { self.qa_chat_height } else { 20 };
        self.qa_scroll = total.saturating_sub(visible);
    }

    pub fn scroll_doc_chat_to_bottom(&mut self) {
        let total = chat_total_lines(&self.doc_chat, self.doc_chat_width);
        let visible = if self.doc_chat_height > 0 { self.doc_chat_height } else { 10 };
        self.doc_chat_scroll = total.saturating_sub(visible);
    }
}

/// Line count of a rendered chat log, accounting for wrapping, so the view
/// can be pinned to the bottom.
fn chat_total_lines(session: &ChatSession, width: u16) -> u16 {
    // Use actual chat width for wrap calculation, default to 50 if not set
    let wrap_width = if width > 0 { width as usize } else { 50 };

    let mut total_lines: u16 = 0;
    for msg in session.messages() {
        total_lines += 1; // Role line ("You:" or "AI:")
        for line in msg.content.lines() {
            // Use character count, not byte length, for proper UTF-8 handling
            let char_count = line.chars().count();
            if char_count == 0 {
                total_lines += 1;
            } else {
                total_lines += ((char_count / wrap_width) + 1) as u16;
            }
        }
        total_lines += 1; // Blank line after message
    }
    if session.pending() > 0 {
        total_lines += 2; // "AI:" + "Thinking..."
    }
    total_lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sample_report;
    use crate::assistant::{AssistantReply, ChatRole};
    use crate::services::VOICE_TRANSCRIPT;
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppEvent>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut config = Config::new();
        config.start_dir = Some(tmp.path().to_string_lossy().into_owned());
        let mut app = App::new(config, Services::simulated_instant(), tx).unwrap();
        app.upload_latency = Duration::ZERO;
        (app, rx, tmp)
    }

    fn signed_in(app: &mut App) {
        app.session = Some(UserProfile {
            name: Some("Priya Sharma".to_string()),
            phone: "9876543210".to_string(),
            email: None,
            preferred_language: Language::En,
            state: None,
        });
    }

    fn sample_doc() -> UploadedDocument {
        UploadedDocument {
            name: "lease.pdf".to_string(),
            kind: DocumentKind::Pdf,
            size_bytes: 3,
            data: b"pdf".to_vec(),
        }
    }

    #[test]
    fn sign_up_without_terms_is_rejected() {
        let (mut app, _rx, _tmp) = test_app();
        app.toggle_auth_mode();
        assert_eq!(app.auth_mode, AuthMode::SignUp);
        assert_eq!(app.auth_field, AuthField::Name);

        app.auth_name = "Priya Sharma".to_string();
        app.auth_email = "priya@example.com".to_string();
        app.auth_phone = "9876543210".to_string();
        app.auth_password = "secret".to_string();
        app.auth_terms = false;

        app.submit_auth();
        assert!(!app.auth_pending);
        assert_eq!(app.toasts.back().unwrap().title, "Terms Required");
    }

    #[tokio::test]
    async fn sign_in_also_requires_accepted_terms() {
        let (mut app, _rx, _tmp) = test_app();
        assert_eq!(app.auth_mode, AuthMode::SignIn);
        assert_eq!(AuthField::Password.next(AuthMode::SignIn), AuthField::Terms);
        assert_eq!(AuthField::Phone.prev(AuthMode::SignIn), AuthField::Terms);

        app.auth_phone = "9876543210".to_string();
        app.auth_password = "secret".to_string();
        app.submit_auth();
        assert!(!app.auth_pending);
        assert_eq!(app.toasts.back().unwrap().title, "Terms Required");

        app.auth_terms = true;
        app.submit_auth();
        assert!(app.auth_pending);
    }

    #[test]
    fn invalid_form_never_reaches_the_authenticator() {
        let (mut app, _rx, _tmp) = test_app();
        app.auth_phone = "12345".to_string();
        app.auth_password = "secret".to_string();

        app.submit_auth();
        assert!(!app.auth_pending);
        assert_eq!(app.toasts.back().unwrap().title, "Invalid Details");
    }

    #[tokio::test]
    async fn upload_flows_into_analysis() {
        let (mut app, mut rx, tmp) = test_app();
        signed_in(&mut app);
        std::fs::write(tmp.path().join("lease.pdf"), b"fake pdf bytes").unwrap();

        app.go_upload();
        let idx = app
            .browser
            .entries
            .iter()
            .position(|e| e.name == "lease.pdf")
            .unwrap();
        app.browser_state.select(Some(idx));
        app.choose_entry().unwrap();
        assert!(app.pending_file.is_some());

        app.start_upload();
        assert!(app.uploading);
        let AppEvent::Uploaded { gen, result } = rx.recv().await.unwrap() else {
            panic!("expected an upload completion");
        };
        app.on_uploaded(gen, result);
        assert_eq!(app.screen, Screen::Analysis);
        assert!(app.analyzing);
        assert!(app.document.is_some());

        let AppEvent::Analyzed { gen, result } = rx.recv().await.unwrap() else {
            panic!("expected an analysis completion");
        };
        app.on_analyzed(gen, result);
        assert!(!app.analyzing);
        assert_eq!(app.report.as_ref().unwrap().clauses.len(), 4);
        assert_eq!(app.clause_state.selected(), Some(0));
    }

    #[tokio::test]
    async fn stale_upload_completion_is_dropped() {
        let (mut app, mut rx, tmp) = test_app();
        signed_in(&mut app);
        std::fs::write(tmp.path().join("lease.pdf"), b"fake pdf bytes").unwrap();

        app.go_upload();
        let idx = app
            .browser
            .entries
            .iter()
            .position(|e| e.name == "lease.pdf")
            .unwrap();
        app.browser_state.select(Some(idx));
        app.choose_entry().unwrap();
        app.start_upload();

        let AppEvent::Uploaded { gen, result } = rx.recv().await.unwrap() else {
            panic!("expected an upload completion");
        };
        // User left the upload screen before the completion arrived
        app.go_home();
        app.on_uploaded(gen, result);
        assert_eq!(app.screen, Screen::Home);
        assert!(app.document.is_none());
    }

    #[tokio::test]
    async fn same_document_does_not_restart_analysis() {
        let (mut app, _rx, _tmp) = test_app();
        signed_in(&mut app);

        app.document_uploaded(sample_doc());
        assert_eq!(app.screen, Screen::Analysis);
        let gen_before = app.analysis_gen;

        app.document_uploaded(sample_doc());
        assert_eq!(app.analysis_gen, gen_before);

        // A different file does restart
        let mut other = sample_doc();
        other.name = "agreement.pdf".to_string();
        app.document_uploaded(other);
        assert_eq!(app.analysis_gen, gen_before + 1);
    }

    #[test]
    fn analysis_failure_returns_to_upload() {
        let (mut app, _rx, _tmp) = test_app();
        signed_in(&mut app);
        app.screen = Screen::Analysis;
        app.analyzing = true;

        app.on_analyzed(
            app.analysis_gen,
            Err(ServiceError::Analysis("backend unreachable".to_string())),
        );
        assert_eq!(app.screen, Screen::Upload);
        assert!(!app.analyzing);
        assert_eq!(app.toasts.back().unwrap().title, "Analysis Failed");
    }

    #[tokio::test]
    async fn question_and_reply_are_paired() {
        let (mut app, mut rx, _tmp) = test_app();
        signed_in(&mut app);
        app.go_qa();
        assert_eq!(app.qa_chat.messages().len(), 1); // greeting

        app.qa_input = "Is a verbal agreement binding?".to_string();
        app.send_qa();
        assert_eq!(app.qa_chat.pending(), 1);
        assert_eq!(app.qa_chat.messages().len(), 2);

        let AppEvent::Reply { scope, epoch, user_id, result } = rx.recv().await.unwrap() else {
            panic!("expected a reply");
        };
        app.on_reply(scope, epoch, user_id, result);
        assert_eq!(app.qa_chat.pending(), 0);
        assert_eq!(app.qa_chat.messages().len(), 3);
        assert_eq!(app.qa_chat.messages()[2].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn reply_from_a_previous_conversation_is_ignored() {
        let (mut app, mut rx, _tmp) = test_app();
        signed_in(&mut app);
        app.go_qa();
        app.qa_input = "What is stamp duty?".to_string();
        app.send_qa();

        let AppEvent::Reply { scope, epoch, user_id, result } = rx.recv().await.unwrap() else {
            panic!("expected a reply");
        };
        // Re-entering Q&A starts a fresh conversation
        app.go_qa();
        app.on_reply(scope, epoch, user_id, result);
        assert_eq!(app.qa_chat.messages().len(), 1); // only the new greeting
        assert_eq!(app.qa_chat.pending(), 0);
    }

    #[tokio::test]
    async fn voice_transcript_fills_the_draft() {
        let (mut app, mut rx, _tmp) = test_app();
        signed_in(&mut app);
        app.go_qa();

        app.toggle_voice();
        assert_eq!(app.voice, VoiceState::Listening);

        let AppEvent::Transcript { gen, result } = rx.recv().await.unwrap() else {
            panic!("expected a transcript");
        };
        app.on_transcript(gen, result);
        assert_eq!(app.voice, VoiceState::Transcribed);
        assert_eq!(app.qa_input, VOICE_TRANSCRIPT);
        assert_eq!(app.qa_cursor, VOICE_TRANSCRIPT.chars().count());
    }

    #[tokio::test]
    async fn stopping_voice_discards_the_transcript() {
        let (mut app, mut rx, _tmp) = test_app();
        signed_in(&mut app);
        app.go_qa();

        app.toggle_voice();
        let AppEvent::Transcript { gen, result } = rx.recv().await.unwrap() else {
            panic!("expected a transcript");
        };
        app.toggle_voice(); // stop before the completion is applied
        assert_eq!(app.voice, VoiceState::Idle);

        app.on_transcript(gen, result);
        assert!(app.qa_input.is_empty());
        assert_eq!(app.voice, VoiceState::Idle);
    }

    #[tokio::test]
    async fn going_home_clears_the_analysis() {
        let (mut app, _rx, _tmp) = test_app();
        signed_in(&mut app);
        app.document_uploaded(sample_doc());

        app.go_home();
        assert_eq!(app.screen, Screen::Home);
        assert!(app.document.is_none());
        assert!(app.report.is_none());
        assert!(!app.analyzing);
    }

    #[tokio::test]
    async fn going_home_settles_pending_question_replies() {
        let (mut app, _rx, _tmp) = test_app();
        signed_in(&mut app);
        app.go_qa();
        app.qa_input = "What are my rights as a tenant?".to_string();
        app.send_qa();
        let epoch = app.qa_chat.epoch();
        let user_id = app.qa_chat.messages().last().unwrap().id;
        assert_eq!(app.qa_chat.pending(), 1);

        app.go_home();
        assert_eq!(app.qa_chat.pending(), 0);
        assert!(!app.is_busy());

        // A completion queued for the abandoned conversation is stale
        app.on_reply(
            ChatScope::General,
            epoch,
            user_id,
            Ok(AssistantReply {
                content: "Too late.".to_string(),
                category: None,
            }),
        );
        assert!(app.qa_chat.is_empty());
    }

    #[tokio::test]
    async fn leaving_upload_returns_to_an_open_report() {
        let (mut app, _rx, _tmp) = test_app();
        signed_in(&mut app);
        app.document_uploaded(sample_doc());
        let gen = app.analysis_gen;
        app.on_analyzed(gen, Ok(sample_report()));
        assert_eq!(app.screen, Screen::Analysis);

        app.go_upload();
        assert_eq!(app.screen, Screen::Upload);
        app.back_from_upload();
        assert_eq!(app.screen, Screen::Analysis);
        assert!(app.report.is_some());

        app.go_home();
        app.go_upload();
        app.back_from_upload();
        assert_eq!(app.screen, Screen::Home);
    }

    #[test]
    fn toasts_expire_after_their_ticks() {
        let (mut app, _rx, _tmp) = test_app();
        app.push_toast("Welcome!", "hello", ToastKind::Success);
        for _ in 0..TOAST_TICKS {
            app.tick();
        }
        assert!(app.toasts.is_empty());
    }

    #[test]
    fn language_picker_edits_the_form_before_sign_in() {
        let (mut app, _rx, _tmp) = test_app();
        app.open_language_picker();
        assert!(app.show_language_picker);
        app.apply_language_choice(1);
        assert_eq!(app.auth_language, Language::Hi);
        assert!(!app.show_language_picker);
    }
}
