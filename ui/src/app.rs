//! Application shell.

use std::sync::Arc;

use fundesk_business::{BusinessConfig, EhttpFetcher, FetchService, SessionScope};
use fundesk_states::Time;

use crate::screens::{LimitedPartnersScreen, TasksScreen};
use crate::state::State;

/// Top-level pages reachable from the menu bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Tasks,
    LimitedPartners,
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Self::Tasks => "Tasks",
            Self::LimitedPartners => "Limited partners",
        }
    }
}

/// The eframe application: menu bar plus the active screen.
pub struct FundeskApp {
    state: State,
    screen: Screen,
    tasks: TasksScreen,
    limited_partners: LimitedPartnersScreen,
}

impl FundeskApp {
    /// Called once before the first frame.
    pub fn new(state: State) -> Self {
        Self::with_fetcher(state, Arc::new(EhttpFetcher))
    }

    /// Builds the app on top of a custom HTTP transport.
    pub fn with_fetcher(mut state: State, fetcher: Arc<dyn FetchService>) -> Self {
        sync_session(&mut state);
        let config = state.ctx.state::<BusinessConfig>().clone();
        let session = state.ctx.state::<SessionScope>().handle();

        let tasks = TasksScreen::new(&config, &fetcher, &session);
        let limited_partners = LimitedPartnersScreen::new(&config, &fetcher, &session);

        Self {
            state,
            screen: Screen::default(),
            tasks,
            limited_partners,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
    }

    pub fn tasks(&self) -> &TasksScreen {
        &self.tasks
    }

    pub fn limited_partners(&self) -> &LimitedPartnersScreen {
        &self.limited_partners
    }
}

/// Keeps the session in line with the configured credentials. Clearing the
/// credentials signs the screens out.
fn sync_session(state: &mut State) {
    let credentials = state.ctx.state::<BusinessConfig>().credentials.clone();
    let scope = state.ctx.state_mut::<SessionScope>();
    match credentials {
        Some(credentials) => {
            scope.session(&credentials);
        }
        None => scope.invalidate(),
    }
}

impl eframe::App for FundeskApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.follow_clock {
            self.state.ctx.state_mut::<Time>().tick();
        }
        let now = self.state.ctx.state::<Time>().now();
        sync_session(&mut self.state);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                for screen in [Screen::Tasks, Screen::LimitedPartners] {
                    if ui
                        .selectable_label(self.screen == screen, screen.title())
                        .clicked()
                    {
                        self.screen = screen;
                    }
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.screen {
            Screen::Tasks => self.tasks.show(ui, now),
            Screen::LimitedPartners => self.limited_partners.show(ui, now),
        });

        let repaint = match self.screen {
            Screen::Tasks => self.tasks.repaint_after(now),
            Screen::LimitedPartners => self.limited_partners.repaint_after(now),
        };
        if let Some(after) = repaint {
            ctx.request_repaint_after(after.to_std().unwrap_or_default());
        }
    }
}
