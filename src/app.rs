use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::action::Action;
use crate::config::Config;
use crate::controller::{LoadController, PageRequest, Phase, Trigger};
use crate::event::Event;
use crate::fetcher::PageFetcher;
use crate::types::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    List,   // Paged item list
    Detail, // Single item
}

pub struct App {
    pub screen: Screen,
    pub title: String,
    pub controller: LoadController<Item>,
    pub selected: usize,
    pub scroll_offset: usize,
    pub current_item: Option<Item>,
    /// App-level message, e.g. a browser that failed to launch
    pub notice: Option<String>,
    pub should_quit: bool,
    pub viewport_rows: u16,
    end_threshold: usize,
    fetcher: Arc<dyn PageFetcher>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
}

impl App {
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            screen: Screen::List,
            title: config.title(),
            controller: LoadController::new(config.load_options()),
            selected: 0,
            scroll_offset: 0,
            current_item: None,
            notice: None,
            should_quit: false,
            viewport_rows: 24,
            end_threshold: config.list.end_threshold,
            fetcher,
            action_tx,
            cancel: CancellationToken::new(),
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::Mount,
            Event::Resize(rows) => Action::Resize(rows),
            Event::Key(key) => self.handle_key(key),
            Event::Tick | Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('d') => Action::PageDown,
                KeyCode::Char('u') => Action::PageUp,
                _ => Action::None,
            };
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => match self.screen {
                Screen::List => Action::Quit,
                Screen::Detail => Action::Back,
            },
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::PageDown => Action::PageDown,
            KeyCode::PageUp => Action::PageUp,
            KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
            KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
            KeyCode::Char('o') => Action::OpenInBrowser,
            KeyCode::Enter if self.screen == Screen::List => Action::Select,
            KeyCode::Char('r') if self.screen == Screen::List => Action::Refresh,
            KeyCode::Char('n') if self.screen == Screen::List => Action::LoadMore,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        if self.notice.is_some()
            && !matches!(
                action,
                Action::None | Action::Resize(_) | Action::PageLoaded { .. }
            )
        {
            self.notice = None;
        }

        match action {
            Action::Quit => {
                self.unmount();
                self.should_quit = true;
            }
            Action::Back => match self.screen {
                Screen::List => {
                    self.unmount();
                    self.should_quit = true;
                }
                Screen::Detail => {
                    self.screen = Screen::List;
                    self.current_item = None;
                    self.scroll_offset = 0;
                }
            },
            Action::ScrollUp => match self.screen {
                Screen::List => self.selected = self.selected.saturating_sub(1),
                Screen::Detail => self.scroll_offset = self.scroll_offset.saturating_sub(1),
            },
            Action::ScrollDown => match self.screen {
                Screen::List => self.move_selection(1),
                Screen::Detail => self.scroll_offset += 1,
            },
            Action::PageUp => {
                let step = self.half_page();
                match self.screen {
                    Screen::List => self.selected = self.selected.saturating_sub(step),
                    Screen::Detail => self.scroll_offset = self.scroll_offset.saturating_sub(step),
                }
            }
            Action::PageDown => {
                let step = self.half_page();
                match self.screen {
                    Screen::List => self.move_selection(step),
                    Screen::Detail => self.scroll_offset += step,
                }
            }
            Action::GoToTop => match self.screen {
                Screen::List => self.selected = 0,
                Screen::Detail => self.scroll_offset = 0,
            },
            Action::GoToBottom => {
                if self.screen == Screen::List {
                    let len = self.controller.items().len();
                    self.move_selection(len);
                }
            }
            Action::Select => {
                if let Some(item) = self.controller.items().get(self.selected) {
                    self.current_item = Some(item.clone());
                    self.scroll_offset = 0;
                    self.screen = Screen::Detail;
                }
            }
            Action::Resize(rows) => {
                self.viewport_rows = rows;
            }

            Action::Mount => self.trigger(Trigger::Mount),
            Action::Refresh => self.trigger(Trigger::Refresh),
            Action::LoadMore => self.trigger(Trigger::EndReached),

            Action::PageLoaded { load_id, result } => {
                let replacing = matches!(
                    self.controller.phase(),
                    Phase::InitialLoading | Phase::Refreshing
                ) && result.is_ok();
                if self.controller.complete(load_id, result) {
                    let len = self.controller.items().len();
                    if replacing {
                        self.selected = 0;
                    } else if self.selected >= len {
                        self.selected = len.saturating_sub(1);
                    }
                }
            }

            Action::OpenInBrowser => {
                let item = match self.screen {
                    Screen::List => self.controller.items().get(self.selected),
                    Screen::Detail => self.current_item.as_ref(),
                };
                match item.and_then(Item::link) {
                    Some(link) => {
                        if let Err(e) = open::that(link) {
                            self.notice = Some(format!("Could not open browser: {}", e));
                        }
                    }
                    None => {
                        if item.is_some() {
                            self.notice = Some("No link for this item".to_string());
                        }
                    }
                }
            }

            Action::None => {}
        }
    }

    /// Move the list selection down and fire the end-of-list trigger once the
    /// selection is within `end_threshold` rows of the last item.
    fn move_selection(&mut self, step: usize) {
        let len = self.controller.items().len();
        if len == 0 {
            return;
        }
        self.selected = (self.selected + step).min(len - 1);

        let remaining = len - 1 - self.selected;
        if remaining <= self.end_threshold {
            self.trigger(Trigger::EndReached);
        }
    }

    fn half_page(&self) -> usize {
        (self.viewport_rows as usize / 2).max(1)
    }

    fn trigger(&mut self, trigger: Trigger) {
        if let Some(request) = self.controller.dispatch(trigger) {
            self.spawn_fetch(request);
        }
    }

    fn spawn_fetch(&self, request: PageRequest) {
        let tx = self.action_tx.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(load_id = request.load_id, "fetch cancelled");
                }
                result = fetcher.fetch(request.page, request.page_size) => {
                    tx.send(Action::PageLoaded {
                        load_id: request.load_id,
                        result,
                    })
                    .ok();
                }
            }
        });
    }

    /// Detach the list: in-flight fetches are cancelled and any result that
    /// still arrives is ignored.
    pub fn unmount(&mut self) {
        self.controller.unmount();
        self.cancel.cancel();
    }
}
