//! Base types and host abstractions for the realtime voice bridge.
//!
//! The bridge negotiates one peer-to-peer audio session with a remote speech
//! model. Everything that touches the embedding host (microphone, peer
//! connection, data channel, audio playback, page viewport) is expressed as a
//! trait so the call lifecycle can run against a browser binding, a native
//! WebRTC stack, or an in-memory test double.
//!
//! # Call Lifecycle
//!
//! ```text
//! Idle -> AcquiringMedia -> FetchingCredential -> Negotiating -> Connected -> Ended
//!              \__________________ any failure ________________/
//!                                    |
//!                                 Failed -> Idle
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::core::language::Language;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while starting or running a voice call.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// The credential endpoint returned no usable token
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Microphone permission was denied or capture failed
    #[error("Media unavailable: {0}")]
    MediaUnavailable(String),

    /// Credential endpoint failed
    #[error("Credential request failed: {0}")]
    CredentialFailed(String),

    /// Remote offer/answer exchange failed
    #[error("Negotiation failed (status {status}): {message}")]
    NegotiationFailed {
        /// HTTP status returned by the provider, 0 when no response was received
        status: u16,
        /// Response body or transport error
        message: String,
    },

    /// Peer connection operation failed
    #[error("Peer connection error: {0}")]
    PeerConnection(String),

    /// Control channel error
    #[error("Control channel error: {0}")]
    ControlChannel(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Provider-side error while minting a session
    #[error("Provider error (status {status}): {body}")]
    ProviderError {
        /// HTTP status returned by the provider
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The call was ended while it was still being set up
    #[error("Call cancelled")]
    Cancelled,
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

impl From<serde_json::Error> for RealtimeError {
    fn from(err: serde_json::Error) -> Self {
        RealtimeError::SerializationError(err.to_string())
    }
}

// =============================================================================
// Call State
// =============================================================================

/// Lifecycle state of the voice call owned by a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    /// No call in progress
    #[default]
    Idle,
    /// Waiting for microphone permission and capture
    AcquiringMedia,
    /// Waiting for the short-lived credential
    FetchingCredential,
    /// Building the peer connection and exchanging descriptions
    Negotiating,
    /// Audio session established
    Connected,
    /// Call ended by the user or by connection loss
    Ended,
    /// Call setup failed; the bridge returns to `Idle` right after
    Failed,
}

impl CallState {
    /// Whether a call is being set up or is live.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::AcquiringMedia | Self::FetchingCredential | Self::Negotiating | Self::Connected
        )
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallState::Idle => write!(f, "Idle"),
            CallState::AcquiringMedia => write!(f, "AcquiringMedia"),
            CallState::FetchingCredential => write!(f, "FetchingCredential"),
            CallState::Negotiating => write!(f, "Negotiating"),
            CallState::Connected => write!(f, "Connected"),
            CallState::Ended => write!(f, "Ended"),
            CallState::Failed => write!(f, "Failed"),
        }
    }
}

// =============================================================================
// Credential
// =============================================================================

/// Short-lived secret issued by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientSecret {
    /// Ephemeral token value
    #[serde(default)]
    pub value: String,
    /// Expiry as a unix timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

/// Response of the per-language credential endpoint.
///
/// Only `client_secret.value` is required; the rest of the provider's session
/// object is carried through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionCredential {
    /// Ephemeral secret
    #[serde(default)]
    pub client_secret: Option<ClientSecret>,
    /// Remaining session fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionCredential {
    /// The ephemeral token, if present and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.client_secret
            .as_ref()
            .map(|s| s.value.trim())
            .filter(|v| !v.is_empty())
    }
}

// =============================================================================
// Peer Connection Types
// =============================================================================

/// Kind of a session description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    /// Local offer
    Offer,
    /// Remote answer
    Answer,
}

/// A session description in raw SDP form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Offer or answer
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    /// Raw SDP text
    pub sdp: String,
}

impl SessionDescription {
    /// Build an offer description.
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    /// Build an answer description.
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// ICE candidate gathering progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IceGatheringState {
    /// Gathering has not started
    #[default]
    New,
    /// Candidates are being gathered
    Gathering,
    /// All candidates gathered
    Complete,
}

/// Transport-level state of the peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    /// Created, not yet connecting
    New,
    /// ICE/DTLS in progress
    Connecting,
    /// Media flowing
    Connected,
    /// Connectivity temporarily lost
    Disconnected,
    /// Connectivity permanently lost
    Failed,
    /// Closed locally
    Closed,
}

impl PeerConnectionState {
    /// States after which a live call must be torn down.
    #[inline]
    pub fn is_lost(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed)
    }
}

/// Options used to construct a peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConnectionConfig {
    /// STUN/TURN server URLs
    pub ice_servers: Vec<String>,
}

/// Events emitted by the peer connection.
pub enum PeerEvent {
    /// Transport state changed
    StateChanged(PeerConnectionState),
    /// Remote media arrived
    RemoteTrack(SharedTrack),
}

impl fmt::Debug for PeerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerEvent::StateChanged(state) => f.debug_tuple("StateChanged").field(state).finish(),
            PeerEvent::RemoteTrack(track) => f.debug_tuple("RemoteTrack").field(&track.id()).finish(),
        }
    }
}

/// Events emitted by the control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Channel is open and may carry messages
    Open,
    /// One text message from the remote model
    Message(String),
    /// Channel closed
    Closed,
}

// =============================================================================
// Host Traits
// =============================================================================

/// A local or remote audio track.
pub trait AudioTrack: Send + Sync {
    /// Host identifier of the track.
    fn id(&self) -> &str;

    /// Stop the track. Stopping twice is harmless.
    fn stop(&self);

    /// Whether the track is still producing media.
    fn is_live(&self) -> bool;
}

/// Shared handle to an audio track.
pub type SharedTrack = Arc<dyn AudioTrack>;

/// Microphone access.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request permission and capture the microphone.
    ///
    /// Returns `RealtimeError::MediaUnavailable` when the user denies access.
    async fn capture_microphone(&self) -> RealtimeResult<Vec<SharedTrack>>;
}

/// Ordered, reliable text channel carried over the peer connection.
pub trait ControlChannel: Send + Sync {
    /// Send one text message.
    fn send(&self, message: String) -> RealtimeResult<()>;

    /// Close the channel. Closing twice is harmless.
    fn close(&self);

    /// Whether the channel can currently carry messages.
    fn is_open(&self) -> bool;
}

/// A freshly created control channel and its event stream.
pub struct ChannelHandle {
    /// The channel itself
    pub channel: Arc<dyn ControlChannel>,
    /// Open/message/close notifications
    pub events: mpsc::UnboundedReceiver<ChannelEvent>,
}

/// One peer connection to the remote provider.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Attach a local track for sending.
    fn add_track(&self, track: SharedTrack) -> RealtimeResult<()>;

    /// Create the control channel with the given label.
    fn create_data_channel(&self, label: &str) -> RealtimeResult<ChannelHandle>;

    /// Generate a local offer.
    async fn create_offer(&self) -> RealtimeResult<SessionDescription>;

    /// Apply the local description and start ICE gathering.
    async fn set_local_description(&self, description: SessionDescription) -> RealtimeResult<()>;

    /// Current local description, including candidates gathered so far.
    fn local_description(&self) -> Option<SessionDescription>;

    /// Apply the remote answer.
    async fn set_remote_description(&self, description: SessionDescription) -> RealtimeResult<()>;

    /// Close the connection. Closing twice is harmless.
    fn close(&self);
}

/// A freshly created peer connection and its notification streams.
pub struct PeerConnectionHandle {
    /// The connection itself
    pub connection: Arc<dyn PeerConnection>,
    /// Transport state and remote track notifications
    pub events: mpsc::UnboundedReceiver<PeerEvent>,
    /// ICE gathering progress
    pub ice_gathering: watch::Receiver<IceGatheringState>,
}

/// Constructs peer connections.
#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    /// Create a new peer connection.
    async fn create(&self, config: &PeerConnectionConfig) -> RealtimeResult<PeerConnectionHandle>;
}

/// Audio output for the remote voice.
pub trait PlaybackSink: Send + Sync {
    /// Route the remote track to the speaker.
    fn attach(&self, track: SharedTrack);

    /// Stop playback and release the attached track.
    fn detach(&self);

    /// Start the looping ringback tone while the call connects.
    fn start_ringback(&self) {}

    /// Stop the ringback tone.
    fn stop_ringback(&self) {}
}

/// Page viewport used by the navigation capability.
pub trait SectionNavigator: Send + Sync {
    /// Scroll the section with the given identifier into the vertical center
    /// of the viewport. Returns `false` when no such section exists.
    fn scroll_to(&self, section: &str) -> bool;
}

/// Source of short-lived realtime credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch a credential bound to the given language.
    async fn fetch(&self, language: Language) -> RealtimeResult<SessionCredential>;
}

/// One-shot offer/answer exchange with the remote provider.
#[async_trait]
pub trait SdpExchange: Send + Sync {
    /// Post the local offer and return the remote answer SDP.
    async fn exchange(&self, offer_sdp: &str, token: &str) -> RealtimeResult<String>;
}

// =============================================================================
// Function Calls
// =============================================================================

/// Function call request from the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallRequest {
    /// Correlation id supplied by the model
    pub call_id: String,
    /// Function name
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}
