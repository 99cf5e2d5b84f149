use fundesk_business::{BusinessConfig, SessionScope};
use fundesk_states::{StateCtx, Time};

/// The main application state.
pub struct State {
    /// The state context for business logic.
    pub ctx: StateCtx,
    /// Refresh [`Time`] from the wall clock every frame. Tests turn this off
    /// and move time themselves.
    pub follow_clock: bool,
}

impl Default for State {
    fn default() -> Self {
        Self::with_config(BusinessConfig::default())
    }
}

impl State {
    pub fn with_config(config: BusinessConfig) -> Self {
        let mut ctx = StateCtx::new();

        ctx.add_state(Time::default());
        ctx.add_state(config);
        ctx.add_state(SessionScope::new());

        Self {
            ctx,
            follow_clock: true,
        }
    }

    pub fn test(base_url: String) -> Self {
        let mut state = Self::with_config(BusinessConfig::new(base_url));
        state.follow_clock = false;
        state
    }
}
