// feed-client/src/view.rs
use actix::{Actor, AsyncContext, Context, Handler, Message, MessageResult, SpawnHandle};
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::time::Duration;

/// Everything the feed page shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub status: String,
    pub login_visible: bool,
    pub logout_visible: bool,
    /// Most recent first
    pub events: VecDeque<String>,
    pub overlay: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            status: "Checking session...".to_string(),
            login_visible: false,
            logout_visible: false,
            events: VecDeque::new(),
            overlay: None,
        }
    }
}

impl ViewState {
    pub fn apply(&mut self, update: &ViewUpdate) {
        match update {
            ViewUpdate::Status(text) => self.status = text.clone(),
            ViewUpdate::Authenticated => {
                self.login_visible = false;
                self.logout_visible = true;
            },
            ViewUpdate::LoggedOut => {
                self.login_visible = true;
                self.logout_visible = false;
            },
            ViewUpdate::Event(text) => self.events.push_front(text.clone()),
            ViewUpdate::ClearFeed => self.events.clear(),
            ViewUpdate::Overlay(text) => self.overlay = Some(text.clone()),
        }
    }

    /// Terminal rendering of the page
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "status: {}", self.status);
        if self.login_visible {
            let _ = writeln!(out, "[login]");
        }
        if self.logout_visible {
            let _ = writeln!(out, "[logout]");
        }
        if let Some(overlay) = &self.overlay {
            let _ = writeln!(out, ">> {}", overlay);
        }
        for event in &self.events {
            let _ = writeln!(out, "  - {}", event);
        }
        out
    }
}

/// Change to the view
#[derive(Debug, Clone, PartialEq, Eq, Message)]
#[rtype(result = "()")]
pub enum ViewUpdate {
    Status(String),
    /// Hide login, show logout
    Authenticated,
    /// Show login, hide logout
    LoggedOut,
    Event(String),
    ClearFeed,
    /// Transient toast, hidden again after the overlay duration
    Overlay(String),
}

#[derive(Message)]
#[rtype(result = "ViewState")]
pub struct GetViewState;

/// Actor holding the view state and the overlay auto-hide timer
pub struct ViewActor {
    state: ViewState,
    overlay_duration: Duration,
    overlay_timer: Option<SpawnHandle>,
    echo: bool,
}

impl ViewActor {
    pub fn new(overlay_duration: Duration) -> Self {
        Self {
            state: ViewState::default(),
            overlay_duration,
            overlay_timer: None,
            echo: false,
        }
    }

    /// Print the rendered page to stdout after every change
    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    fn show(&self) {
        if self.echo {
            println!("{}", self.state.render());
        }
    }
}

impl Actor for ViewActor {
    type Context = Context<Self>;
}

impl Handler<ViewUpdate> for ViewActor {
    type Result = ();

    fn handle(&mut self, msg: ViewUpdate, ctx: &mut Self::Context) -> Self::Result {
        tracing::debug!("View update: {:?}", msg);
        self.state.apply(&msg);

        if let ViewUpdate::Overlay(_) = msg {
            if let Some(handle) = self.overlay_timer.take() {
                ctx.cancel_future(handle);
            }
            let handle = ctx.run_later(self.overlay_duration, |act, _ctx| {
                act.overlay_timer = None;
                act.state.overlay = None;
                act.show();
            });
            self.overlay_timer = Some(handle);
        }

        self.show();
    }
}

impl Handler<GetViewState> for ViewActor {
    type Result = MessageResult<GetViewState>;

    fn handle(&mut self, _msg: GetViewState, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_prepend() {
        let mut state = ViewState::default();
        state.apply(&ViewUpdate::Event("first".into()));
        state.apply(&ViewUpdate::Event("second".into()));
        assert_eq!(state.events, VecDeque::from(vec!["second".to_string(), "first".to_string()]));

        state.apply(&ViewUpdate::ClearFeed);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_button_visibility() {
        let mut state = ViewState::default();
        state.apply(&ViewUpdate::Authenticated);
        assert!(!state.login_visible);
        assert!(state.logout_visible);

        state.apply(&ViewUpdate::LoggedOut);
        assert!(state.login_visible);
        assert!(!state.logout_visible);
    }

    #[test]
    fn test_render() {
        let mut state = ViewState::default();
        state.apply(&ViewUpdate::Status("WebSocket connected!".into()));
        state.apply(&ViewUpdate::Authenticated);
        state.apply(&ViewUpdate::Event("New event: {}".into()));

        let rendered = state.render();
        assert!(rendered.starts_with("status: WebSocket connected!\n"));
        assert!(rendered.contains("[logout]"));
        assert!(!rendered.contains("[login]"));
        assert!(rendered.contains("  - New event: {}"));
    }

    #[actix::test]
    async fn test_overlay_auto_hides() {
        let view = ViewActor::new(Duration::from_millis(30)).start();
        view.send(ViewUpdate::Overlay("Successfully logged in!".into())).await.unwrap();

        let shown = view.send(GetViewState).await.unwrap();
        assert_eq!(shown.overlay.as_deref(), Some("Successfully logged in!"));

        actix::clock::sleep(Duration::from_millis(120)).await;
        let hidden = view.send(GetViewState).await.unwrap();
        assert_eq!(hidden.overlay, None);
    }
}
