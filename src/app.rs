use std::sync::Arc;

use appstore_core::session::DEFAULT_GREETING;
use appstore_core::{
    AppRecord, CatalogBackend, Category, Config, ConversationSession, QueryDispatcher,
    Resolution, ResultSource, SearchResponse, Sender, StoreClient, StoreError, TurnReply,
};
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::tui::AppEvent;

/// How many apps the storefront features before the full list
pub const FEATURED_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Catalog,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// What the detail screen is showing
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading(AppRecord),
    Loaded(AppRecord),
    NotFound(String),
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Catalog state
    pub catalog_loading: bool,
    catalog_generation: u64, // latest reload; older fetches are ignored
    pub search_input: String,
    pub dispatcher: QueryDispatcher,
    pub results_state: ListState,
    pub categories: Vec<Category>,

    // Detail state
    pub detail: Option<DetailState>,
    pub detail_scroll: u16,

    // Assistant state (kept across close/reopen)
    pub chat_open: bool,
    pub chat_input: String,
    pub chat_cursor: usize, // cursor position in chat_input, in chars
    pub session: ConversationSession,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of transcript area for scroll calculations
    pub chat_width: u16,  // Width of transcript area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub client: Arc<StoreClient>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(config: &Config, events: UnboundedSender<AppEvent>) -> anyhow::Result<Self> {
        let base_url = config.api_base_url();
        let client = StoreClient::with_timeout(&base_url, config.request_timeout())?;
        info!(base_url = %base_url, "store client ready");

        let greeting = config
            .greeting
            .clone()
            .unwrap_or_else(|| DEFAULT_GREETING.to_string());

        Ok(Self {
            should_quit: false,
            screen: Screen::Catalog,
            input_mode: InputMode::Normal,

            catalog_loading: false,
            catalog_generation: 0,
            search_input: String::new(),
            dispatcher: QueryDispatcher::new(),
            results_state: ListState::default(),
            categories: Vec::new(),

            detail: None,
            detail_scroll: 0,

            chat_open: false,
            chat_input: String::new(),
            chat_cursor: 0,
            session: ConversationSession::with_greeting(greeting),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            client: Arc::new(client),
            events,
        })
    }

    // Catalog loading

    pub fn load_catalog(&mut self) {
        self.catalog_loading = true;
        self.catalog_generation += 1;
        let generation = self.catalog_generation;

        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client.fetch_catalog().await;
            let _ = tx.send(AppEvent::CatalogLoaded { generation, result });
        });

        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client.fetch_categories().await;
            let _ = tx.send(AppEvent::CategoriesLoaded(result));
        });
    }

    pub fn on_catalog_loaded(
        &mut self,
        generation: u64,
        result: Result<Vec<AppRecord>, StoreError>,
    ) {
        if generation != self.catalog_generation {
            debug!(
                generation,
                latest = self.catalog_generation,
                "dropping superseded catalog load"
            );
            return;
        }
        self.catalog_loading = false;
        match result {
            Ok(records) => {
                info!(count = records.len(), "catalog loaded");
                self.dispatcher.refresh_catalog(records);
                self.reset_selection();
            }
            Err(err) => warn!(error = %err, "failed to load catalog"),
        }
    }

    pub fn on_categories_loaded(&mut self, result: Result<Vec<Category>, StoreError>) {
        match result {
            Ok(categories) => self.categories = categories,
            Err(err) => warn!(error = %err, "failed to load categories"),
        }
    }

    pub fn total_apps(&self) -> usize {
        self.dispatcher.cache().records().len()
    }

    pub fn featured_apps(&self) -> &[AppRecord] {
        self.dispatcher.cache().featured(FEATURED_COUNT)
    }

    // Search

    /// Send the current search box text. Called on every edit, so a newer
    /// query routinely overtakes one still in flight.
    pub fn submit_search(&mut self) {
        let request = self.dispatcher.submit(self.search_input.clone());

        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let response = request.execute(client.as_ref()).await;
            let _ = tx.send(AppEvent::SearchResolved(response));
        });
    }

    pub fn on_search_resolved(&mut self, response: SearchResponse) {
        if let Resolution::Applied { .. } = self.dispatcher.resolve(response) {
            self.reset_selection();
        }
    }

    pub fn showing_fallback(&self) -> bool {
        self.dispatcher.source() == Some(ResultSource::LocalFallback)
    }

    pub fn results(&self) -> &[AppRecord] {
        self.dispatcher.visible()
    }

    pub fn selected_app(&self) -> Option<&AppRecord> {
        self.results_state
            .selected()
            .and_then(|i| self.results().get(i))
    }

    pub fn results_nav_down(&mut self) {
        let len = self.results().len();
        if len > 0 {
            let i = self.results_state.selected().unwrap_or(0);
            self.results_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn results_nav_up(&mut self) {
        let i = self.results_state.selected().unwrap_or(0);
        self.results_state.select(Some(i.saturating_sub(1)));
    }

    fn reset_selection(&mut self) {
        if self.results().is_empty() {
            self.results_state.select(None);
        } else {
            self.results_state.select(Some(0));
        }
    }

    // Detail

    pub fn open_selected(&mut self) {
        let Some(app) = self.selected_app().cloned() else {
            return;
        };

        let id = app.id.clone();
        self.detail = Some(DetailState::Loading(app));
        self.detail_scroll = 0;
        self.screen = Screen::Detail;

        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client.fetch_app(&id).await;
            let _ = tx.send(AppEvent::DetailLoaded { id, result });
        });
    }

    pub fn on_detail_loaded(&mut self, id: String, result: Result<AppRecord, StoreError>) {
        let showing = match &self.detail {
            Some(DetailState::Loading(app)) => app.id == id,
            _ => false,
        };
        if !showing {
            return;
        }

        self.detail = match result {
            Ok(app) => Some(DetailState::Loaded(app)),
            Err(StoreError::NotFound(id)) => Some(DetailState::NotFound(id)),
            Err(err) => {
                // Keep showing the list copy of the record
                warn!(id = %id, error = %err, "failed to load app detail");
                match self.detail.take() {
                    Some(DetailState::Loading(app)) => Some(DetailState::Loaded(app)),
                    other => other,
                }
            }
        };
    }

    pub fn close_detail(&mut self) {
        self.screen = Screen::Catalog;
        self.detail = None;
    }

    pub fn download_url(&self) -> Option<String> {
        match &self.detail {
            Some(DetailState::Loading(app)) | Some(DetailState::Loaded(app)) => {
                self.client.download_url(app)
            }
            _ => None,
        }
    }

    // Assistant

    pub fn toggle_chat(&mut self) {
        self.chat_open = !self.chat_open;
        self.input_mode = if self.chat_open {
            InputMode::Editing
        } else {
            InputMode::Normal
        };
        if self.chat_open {
            self.scroll_chat_to_bottom();
        }
    }

    /// Send the chat input. Rejected turns (blank, or a reply still pending)
    /// leave the input untouched.
    pub fn send_chat(&mut self) {
        let Some(pending) = self.session.send_turn(&self.chat_input) else {
            return;
        };

        self.chat_input.clear();
        self.chat_cursor = 0;
        self.scroll_chat_to_bottom();

        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let reply = pending.execute(client.as_ref()).await;
            let _ = tx.send(AppEvent::ChatReplied(reply));
        });
    }

    pub fn on_chat_reply(&mut self, reply: TurnReply) {
        if self.session.complete(reply).is_some() {
            self.scroll_chat_to_bottom();
        }
    }

    pub fn reset_chat(&mut self) {
        self.session.reset();
        self.chat_scroll = 0;
    }

    pub fn chat_scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn chat_scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_awaiting_reply() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll the transcript so the newest turn (and typing indicator) is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for turn in self.session.transcript() {
            total_lines = total_lines.saturating_add(1); // Sender line ("You:" or "AI:")
            for line in turn.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let wrapped = (line.chars().count() / wrap_width) + 1;
                let wrapped = u16::try_from(wrapped).unwrap_or(u16::MAX);
                total_lines = total_lines.saturating_add(wrapped);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.session.is_awaiting_reply() {
            total_lines = total_lines.saturating_add(2); // "AI:" + typing indicator
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    pub fn sender_label(sender: Sender) -> &'static str {
        match sender {
            Sender::User => "You:",
            Sender::Assistant => "AI:",
        }
    }
}
