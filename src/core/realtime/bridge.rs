//! The realtime voice bridge.
//!
//! `RealtimeBridge` owns at most one `CallSession` at a time. `start_call`
//! captures the microphone and fetches a credential concurrently, negotiates
//! the peer connection, and spawns an event loop that drives the control
//! channel: capability declaration on open, a single delayed greeting, and
//! tool-call round-trips. `end_call` releases everything and is idempotent.
//!
//! Every call attempt gets a generation number. `end_call` bumps it, which
//! turns any setup step still in flight into a no-op that releases whatever
//! it created instead of registering it.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tracing::{debug, error, info, warn};

use super::base::{
    CallState, ChannelEvent, ChannelHandle, ControlChannel, CredentialSource, FunctionCallRequest,
    IceGatheringState, MediaDevices, PeerConnection, PeerConnectionConfig, PeerConnectionFactory,
    PeerConnectionHandle, PeerConnectionState, PeerEvent, PlaybackSink, RealtimeError,
    RealtimeResult, SdpExchange, SectionNavigator, SessionDescription, SharedTrack,
};
use super::config::BridgeConfig;
use super::messages::{ClientEvent, ConversationItem, ServerEvent, SessionConfig};
use super::tools::{ToolDispatcher, navigate_section_tool};
use crate::core::language::Language;

/// Collaborators supplied by the embedding host.
#[derive(Clone)]
pub struct BridgeHost {
    pub media: Arc<dyn MediaDevices>,
    pub peers: Arc<dyn PeerConnectionFactory>,
    pub playback: Arc<dyn PlaybackSink>,
    pub navigator: Arc<dyn SectionNavigator>,
    pub credentials: Arc<dyn CredentialSource>,
    pub sdp: Arc<dyn SdpExchange>,
}

/// Resources of one call attempt.
pub struct CallSession {
    id: String,
    language: Language,
    local_tracks: Vec<SharedTrack>,
    peer: Option<Arc<dyn PeerConnection>>,
    channel: Option<Arc<dyn ControlChannel>>,
    remote_track: Option<SharedTrack>,
    event_task: Option<JoinHandle<()>>,
}

impl CallSession {
    fn new(language: Language) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            language,
            local_tracks: Vec::new(),
            peer: None,
            channel: None,
            remote_track: None,
            event_task: None,
        }
    }

    /// Identifier used in logs.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Language fixed for the lifetime of the call.
    pub fn language(&self) -> Language {
        self.language
    }

    fn release(mut self, playback: &dyn PlaybackSink) {
        for track in self.local_tracks.drain(..) {
            track.stop();
        }
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
        if let Some(peer) = self.peer.take() {
            peer.close();
        }
        if let Some(track) = self.remote_track.take() {
            track.stop();
        }
        playback.detach();
        playback.stop_ringback();
        if let Some(task) = self.event_task.take() {
            task.abort();
        }
    }
}

struct BridgeState {
    phase: CallState,
    generation: u64,
    session: Option<CallSession>,
}

struct BridgeInner {
    host: BridgeHost,
    config: BridgeConfig,
    state: Mutex<BridgeState>,
    state_tx: watch::Sender<CallState>,
}

/// Single-session voice bridge. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct RealtimeBridge {
    inner: Arc<BridgeInner>,
}

impl RealtimeBridge {
    pub fn new(host: BridgeHost, config: BridgeConfig) -> RealtimeResult<Self> {
        if config.ice_servers.len() < 2 {
            return Err(RealtimeError::InvalidConfiguration(
                "At least two ICE servers are required".to_string(),
            ));
        }
        if config.channel_label.is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "Control channel label cannot be empty".to_string(),
            ));
        }

        let (state_tx, _) = watch::channel(CallState::Idle);
        Ok(Self {
            inner: Arc::new(BridgeInner {
                host,
                config,
                state: Mutex::new(BridgeState {
                    phase: CallState::Idle,
                    generation: 0,
                    session: None,
                }),
                state_tx,
            }),
        })
    }

    /// Current call state.
    pub fn state(&self) -> CallState {
        self.inner.state.lock().phase
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<CallState> {
        self.inner.state_tx.subscribe()
    }

    /// Language of the call in progress, if any.
    pub fn language(&self) -> Option<Language> {
        self.inner.state.lock().session.as_ref().map(|s| s.language)
    }

    /// Start a voice call in `language`.
    ///
    /// A call that is already being set up or is live makes this a no-op.
    /// On failure every partially created resource is released and the
    /// bridge is back in `Idle` before the error is returned.
    pub async fn start_call(&self, language: Language) -> RealtimeResult<()> {
        let generation = {
            let mut state = self.inner.state.lock();
            if state.phase.is_active() {
                debug!(state = %state.phase, "start_call ignored: call already in progress");
                return Ok(());
            }
            state.generation += 1;
            let session = CallSession::new(language);
            info!(call_id = %session.id, language = %language, "Starting call");
            state.session = Some(session);
            self.set_phase(&mut state, CallState::AcquiringMedia);
            state.generation
        };

        self.inner.host.playback.start_ringback();

        match self.negotiate(generation, language).await {
            Ok(()) => Ok(()),
            Err(RealtimeError::Cancelled) => {
                debug!("Call ended during setup");
                Err(RealtimeError::Cancelled)
            }
            Err(e) => {
                self.abort_setup(generation, &e);
                Err(e)
            }
        }
    }

    /// End the current call. Safe to call at any time, any number of times.
    pub fn end_call(&self) {
        let session = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            let session = state.session.take();
            if session.is_some() || state.phase.is_active() {
                self.set_phase(&mut state, CallState::Ended);
            }
            session
        };
        self.release(session);
    }

    /// End the call only if it is still the attempt identified by `generation`.
    fn end_generation(&self, generation: u64) {
        let session = {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                return;
            }
            state.generation += 1;
            let session = state.session.take();
            self.set_phase(&mut state, CallState::Ended);
            session
        };
        self.release(session);
    }

    fn release(&self, session: Option<CallSession>) {
        match session {
            Some(session) => {
                info!(call_id = %session.id, "Releasing call resources");
                session.release(self.inner.host.playback.as_ref());
            }
            None => {
                self.inner.host.playback.detach();
                self.inner.host.playback.stop_ringback();
            }
        }
    }

    fn abort_setup(&self, generation: u64, err: &RealtimeError) {
        let session = {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                return;
            }
            state.generation += 1;
            let session = state.session.take();
            self.set_phase(&mut state, CallState::Failed);
            self.set_phase(&mut state, CallState::Idle);
            session
        };
        error!(error = %err, "Call setup failed");
        self.release(session);
    }

    fn set_phase(&self, state: &mut BridgeState, phase: CallState) {
        debug!(from = %state.phase, to = %phase, "Call state transition");
        state.phase = phase;
        self.inner.state_tx.send_replace(phase);
    }

    fn ensure_current(&self, generation: u64) -> RealtimeResult<()> {
        if self.inner.state.lock().generation == generation {
            Ok(())
        } else {
            Err(RealtimeError::Cancelled)
        }
    }

    fn advance(&self, generation: u64, phase: CallState) -> RealtimeResult<()> {
        let mut state = self.inner.state.lock();
        if state.generation != generation {
            return Err(RealtimeError::Cancelled);
        }
        self.set_phase(&mut state, phase);
        Ok(())
    }

    fn with_session<T>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut CallSession) -> T,
    ) -> RealtimeResult<T> {
        let mut state = self.inner.state.lock();
        if state.generation != generation {
            return Err(RealtimeError::Cancelled);
        }
        state
            .session
            .as_mut()
            .map(f)
            .ok_or(RealtimeError::Cancelled)
    }

    async fn negotiate(&self, generation: u64, language: Language) -> RealtimeResult<()> {
        let host = &self.inner.host;

        // Microphone and credential are independent; run both at once.
        let media = async {
            let tracks = host.media.capture_microphone().await?;
            if let Err(e) =
                self.with_session(generation, |s| s.local_tracks.extend(tracks.iter().cloned()))
            {
                tracks.iter().for_each(|t| t.stop());
                return Err(e);
            }
            self.advance(generation, CallState::FetchingCredential)?;
            Ok::<_, RealtimeError>(tracks)
        };
        let (tracks, credential) = tokio::join!(media, host.credentials.fetch(language));

        let tracks = tracks?;
        let credential = credential?;
        let token = credential
            .token()
            .ok_or_else(|| {
                RealtimeError::MissingCredential("No ephemeral key received from server".to_string())
            })?
            .to_string();
        if tracks.is_empty() {
            return Err(RealtimeError::MediaUnavailable(
                "No audio track was captured".to_string(),
            ));
        }

        self.advance(generation, CallState::Negotiating)?;

        let PeerConnectionHandle {
            connection,
            events: peer_events,
            ice_gathering,
        } = host
            .peers
            .create(&PeerConnectionConfig {
                ice_servers: self.inner.config.ice_servers.clone(),
            })
            .await?;
        if let Err(e) = self.with_session(generation, |s| s.peer = Some(connection.clone())) {
            connection.close();
            return Err(e);
        }

        for track in &tracks {
            connection.add_track(track.clone())?;
        }

        let ChannelHandle {
            channel,
            events: channel_events,
        } = connection.create_data_channel(&self.inner.config.channel_label)?;
        if let Err(e) = self.with_session(generation, |s| s.channel = Some(channel.clone())) {
            channel.close();
            return Err(e);
        }

        let offer = connection.create_offer().await?;
        connection.set_local_description(offer.clone()).await?;
        self.wait_for_ice_gathering(ice_gathering).await;
        self.ensure_current(generation)?;

        let local_sdp = connection
            .local_description()
            .map(|d| d.sdp)
            .unwrap_or(offer.sdp);
        let answer = host.sdp.exchange(&local_sdp, &token).await?;
        self.ensure_current(generation)?;
        connection
            .set_remote_description(SessionDescription::answer(answer))
            .await?;

        let mut state = self.inner.state.lock();
        if state.generation != generation {
            return Err(RealtimeError::Cancelled);
        }
        let Some(session) = state.session.as_mut() else {
            return Err(RealtimeError::Cancelled);
        };
        let event_loop = CallEventLoop {
            bridge: self.clone(),
            generation,
            call_id: session.id.clone(),
            language,
            channel,
            dispatcher: ToolDispatcher::new(host.navigator.clone()),
            pending_calls: HashMap::new(),
            greeted: false,
        };
        session.event_task = Some(tokio::spawn(event_loop.run(channel_events, peer_events)));
        info!(call_id = %session.id, language = %language, "Call connected");
        self.set_phase(&mut state, CallState::Connected);
        Ok(())
    }

    /// Wait for ICE gathering to finish, bounded by the configured timeout.
    async fn wait_for_ice_gathering(&self, mut gathering: watch::Receiver<IceGatheringState>) {
        let timeout = self.inner.config.ice_gathering_timeout;
        let complete = gathering.wait_for(|s| *s == IceGatheringState::Complete);
        match tokio::time::timeout(timeout, complete).await {
            Ok(Ok(_)) => debug!("ICE gathering complete"),
            Ok(Err(_)) => debug!("ICE gathering watcher dropped, continuing with current candidates"),
            Err(_) => warn!(
                timeout_ms = timeout.as_millis() as u64,
                "ICE gathering did not complete in time, continuing with current candidates"
            ),
        }
    }
}

/// System message that makes the model open the call with one greeting.
pub fn greeting_instruction(language: Language) -> String {
    format!(
        "The call is now connected. Greet the caller exactly once in {}, for example: \"{}\". \
         Then stop speaking and wait for the caller's question.",
        language.english_name(),
        language.greeting()
    )
}

/// Drives one connected call's control channel and peer events.
struct CallEventLoop {
    bridge: RealtimeBridge,
    generation: u64,
    call_id: String,
    language: Language,
    channel: Arc<dyn ControlChannel>,
    dispatcher: ToolDispatcher,
    /// call_id -> function name, from `response.output_item.added`
    pending_calls: HashMap<String, String>,
    greeted: bool,
}

impl CallEventLoop {
    async fn run(
        mut self,
        mut channel_events: mpsc::UnboundedReceiver<ChannelEvent>,
        mut peer_events: mpsc::UnboundedReceiver<PeerEvent>,
    ) {
        let greeting_delay = self.bridge.inner.config.greeting_delay;
        let mut greeting: Option<Pin<Box<Sleep>>> = None;
        let mut channel_done = false;
        let mut peer_done = false;

        loop {
            tokio::select! {
                event = channel_events.recv(), if !channel_done => match event {
                    Some(ChannelEvent::Open) => {
                        self.on_channel_open();
                        if !self.greeted && greeting.is_none() {
                            greeting = Some(Box::pin(tokio::time::sleep(greeting_delay)));
                        }
                    }
                    Some(ChannelEvent::Message(text)) => self.on_message(&text),
                    Some(ChannelEvent::Closed) | None => {
                        debug!(call_id = %self.call_id, "Control channel closed");
                        channel_done = true;
                        greeting = None;
                    }
                },
                event = peer_events.recv(), if !peer_done => match event {
                    Some(PeerEvent::RemoteTrack(track)) => self.on_remote_track(track),
                    Some(PeerEvent::StateChanged(state)) => {
                        if self.on_peer_state(state) {
                            break;
                        }
                    }
                    None => peer_done = true,
                },
                _ = async {
                    if let Some(sleep) = greeting.as_mut() {
                        sleep.await;
                    }
                }, if greeting.is_some() => {
                    greeting = None;
                    self.send_greeting();
                },
                else => break,
            }
        }

        debug!(call_id = %self.call_id, "Call event loop finished");
    }

    fn send(&self, event: &ClientEvent) -> RealtimeResult<()> {
        let text = event.to_json()?;
        self.channel.send(text).map_err(|e| {
            warn!(call_id = %self.call_id, error = %e, "Failed to send control message");
            e
        })
    }

    fn on_channel_open(&mut self) {
        info!(call_id = %self.call_id, "Control channel open, declaring capabilities");
        let event = ClientEvent::SessionUpdate {
            session: SessionConfig {
                modalities: Some(vec!["audio".to_string(), "text".to_string()]),
                voice: Some(self.bridge.inner.config.voice.as_str().to_string()),
                tools: Some(vec![navigate_section_tool()]),
                tool_choice: Some("auto".to_string()),
                instructions: None,
            },
        };
        let _ = self.send(&event);
    }

    fn send_greeting(&mut self) {
        if self.greeted || !self.channel.is_open() {
            return;
        }
        if self.bridge.ensure_current(self.generation).is_err() {
            return;
        }
        self.greeted = true;
        debug!(call_id = %self.call_id, language = %self.language, "Triggering greeting");

        let item = ConversationItem::system_message(greeting_instruction(self.language));
        if self
            .send(&ClientEvent::ConversationItemCreate { item })
            .is_ok()
        {
            let _ = self.send(&ClientEvent::ResponseCreate);
        }
    }

    fn on_message(&mut self, text: &str) {
        let event = match serde_json::from_str::<ServerEvent>(text) {
            Ok(event) => event,
            Err(e) => {
                debug!(call_id = %self.call_id, error = %e, "Ignoring undecodable control message");
                return;
            }
        };

        match event {
            ServerEvent::SessionCreated { session } => {
                debug!(call_id = %self.call_id, session_id = %session.id, "Realtime session created");
            }
            ServerEvent::SessionUpdated { session } => {
                debug!(call_id = %self.call_id, session_id = %session.id, "Realtime session updated");
            }
            ServerEvent::Error { error } => {
                warn!(
                    call_id = %self.call_id,
                    "Realtime error: {} - {}",
                    error.error_type,
                    error.message
                );
            }
            ServerEvent::OutputItemAdded { item } => {
                if item.item_type == "function_call"
                    && let (Some(call_id), Some(name)) = (item.call_id, item.name)
                {
                    debug!(call_id = %call_id, name = %name, "Tracking function call");
                    self.pending_calls.insert(call_id, name);
                }
            }
            ServerEvent::FunctionCallArgumentsDone {
                call_id,
                name,
                arguments,
            } => {
                let tracked = self.pending_calls.remove(&call_id);
                let Some(name) = name.filter(|n| !n.is_empty()).or(tracked) else {
                    warn!(call_id = %call_id, "Function name not found for call, ignoring");
                    return;
                };
                self.on_function_call(FunctionCallRequest {
                    call_id,
                    name,
                    arguments,
                });
            }
            ServerEvent::ResponseDone { response } => {
                debug!(response_id = %response.id, status = %response.status, "Response done");
            }
            ServerEvent::Other => {}
        }
    }

    fn on_function_call(&mut self, call: FunctionCallRequest) {
        let Some(output) = self.dispatcher.dispatch(&call) else {
            return;
        };
        let output = match serde_json::to_string(&output) {
            Ok(output) => output,
            Err(e) => {
                warn!(call_id = %call.call_id, error = %e, "Failed to encode tool output");
                return;
            }
        };

        let result = ClientEvent::ConversationItemCreate {
            item: ConversationItem::function_call_output(call.call_id, output),
        };
        if self.send(&result).is_ok() {
            let _ = self.send(&ClientEvent::ResponseCreate);
        }
    }

    fn on_remote_track(&mut self, track: SharedTrack) {
        let registered = self
            .bridge
            .with_session(self.generation, |s| s.remote_track = Some(track.clone()));
        if registered.is_ok() {
            debug!(call_id = %self.call_id, track = %track.id(), "Remote audio attached");
            self.bridge.inner.host.playback.attach(track);
        }
    }

    /// Returns `true` when the loop should stop.
    fn on_peer_state(&mut self, state: PeerConnectionState) -> bool {
        match state {
            PeerConnectionState::Connected => {
                info!(call_id = %self.call_id, "Peer connection established");
                self.bridge.inner.host.playback.stop_ringback();
                false
            }
            lost if lost.is_lost() => {
                warn!(call_id = %self.call_id, state = ?lost, "Peer connection lost, ending call");
                self.bridge.end_generation(self.generation);
                true
            }
            PeerConnectionState::Closed => true,
            _ => false,
        }
    }
}
