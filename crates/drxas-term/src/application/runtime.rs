use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use drxas_client::BackendClient;
use drxas_client::ObjectStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::services::ActionsService;
use crate::domain::services::AppState;
use crate::domain::services::AppStateProps;
use crate::domain::services::EventsService;
use crate::infrastructure::clients::ClientManager;

#[cfg(test)]
#[path = "runtime_test.rs"]
mod tests;

/// Applies events to `app_state` until a quit event or until every sender is
/// gone. `render` sees the state once up front and after every event.
pub async fn start_loop<F>(
    app_state: &mut AppState,
    events: &mut EventsService,
    mut render: F,
) -> Result<()>
where
    F: FnMut(&AppState) -> Result<()>,
{
    render(app_state)?;

    while let Some(event) = events.next().await {
        let quit = app_state.handle_event(event)?;
        render(app_state)?;

        if quit {
            break;
        }
    }

    return Ok(());
}

/// A wired session: control-loop state, its event queue and the worker task.
pub struct Session {
    pub app_state: AppState,
    events: EventsService,
    event_tx: mpsc::UnboundedSender<Event>,
    actions: JoinHandle<Result<()>>,
}

impl Session {
    pub fn spawn(
        backend: Arc<dyn BackendClient>,
        storage: Arc<dyn ObjectStore>,
        props: AppStateProps,
    ) -> Result<Session> {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

        let worker_event_tx = event_tx.clone();
        let actions = tokio::spawn(async move {
            let res = ActionsService::start(backend, storage, worker_event_tx, &mut action_rx).await;
            if let Err(err) = &res {
                tracing::error!(error = %err, "Actions service stopped");
            }
            return res;
        });

        let app_state = AppState::new(props, action_tx)?;

        return Ok(Session {
            app_state,
            events: EventsService::new(event_rx),
            event_tx,
            actions,
        });
    }

    /// Loads the config and builds the production clients from it.
    pub async fn from_config(config_file: Option<&str>) -> Result<Session> {
        Config::load(config_file).await?;

        let props = AppStateProps {
            conversation_id: Config::get(ConfigKey::ConversationId),
            request_timeout: Duration::from_secs(Config::get_u64(ConfigKey::RequestTimeoutSecs)?),
        };
        tracing::info!(
            conversation_id = %props.conversation_id,
            timeout_secs = props.request_timeout.as_secs(),
            "Starting session"
        );

        return Session::spawn(ClientManager::backend()?, ClientManager::object_store()?, props);
    }

    pub fn with_tick(mut self, tick: Duration) -> Session {
        self.events = self.events.with_tick(tick);
        return self;
    }

    /// Sender for user intents.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        return self.event_tx.clone();
    }

    /// Runs the control loop to completion and hands back the final state.
    pub async fn run<F>(mut self, render: F) -> Result<AppState>
    where
        F: FnMut(&AppState) -> Result<()>,
    {
        let res = start_loop(&mut self.app_state, &mut self.events, render).await;
        self.actions.abort();
        res?;

        return Ok(self.app_state);
    }
}
