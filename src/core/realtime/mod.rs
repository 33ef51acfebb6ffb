//! Realtime voice session bridge.
//!
//! This module establishes one live, bidirectional audio session with the
//! OpenAI Realtime API over WebRTC and routes model-initiated tool calls to
//! page navigation.
//!
//! # Architecture
//!
//! - `base` - error type, call state, host traits
//! - `messages` - control-channel events
//! - `config` - endpoints, models, voices, negotiation timing
//! - `tools` - the `navigateSection` capability and its dispatcher
//! - `transport` - reqwest implementations of credential fetch and SDP exchange
//! - `bridge` - `RealtimeBridge`, the single-session state machine
//! - `session_mint` - server-side ephemeral session creation
//!
//! # Example
//!
//! ```rust,ignore
//! use festival_concierge::core::realtime::{BridgeConfig, BridgeHost, RealtimeBridge};
//! use festival_concierge::core::language::Language;
//!
//! let bridge = RealtimeBridge::new(host, BridgeConfig::default())?;
//! bridge.start_call(Language::En).await?;
//! // ... conversation ...
//! bridge.end_call();
//! ```

mod base;
mod bridge;
mod config;
mod messages;
mod session_mint;
mod tools;
mod transport;

pub use base::{
    AudioTrack, CallState, ChannelEvent, ChannelHandle, ClientSecret, ControlChannel,
    CredentialSource, FunctionCallRequest, IceGatheringState, MediaDevices, PeerConnection,
    PeerConnectionConfig, PeerConnectionFactory, PeerConnectionHandle, PeerConnectionState,
    PeerEvent, PlaybackSink, RealtimeError, RealtimeResult, SdpExchange, SdpType,
    SectionNavigator, SessionCredential, SessionDescription, SharedTrack,
};
pub use bridge::{BridgeHost, CallSession, RealtimeBridge, greeting_instruction};
pub use config::{
    BridgeConfig, CONTROL_CHANNEL_LABEL, DEFAULT_STUN_SERVERS, GREETING_DELAY,
    ICE_GATHERING_TIMEOUT, OPENAI_REALTIME_SESSIONS_PATH, OPENAI_REALTIME_URL, RealtimeModel,
    RealtimeVoice,
};
pub use messages::{
    ApiError, ClientEvent, ContentPart, ConversationItem, ServerEvent, SessionConfig, ToolDef,
};
pub use session_mint::{MintConfig, SessionMinter, build_instructions};
pub use tools::{NAVIGATE_SECTION, SECTIONS, ToolDispatcher, ToolOutput, navigate_section_tool};
pub use transport::{HttpCredentialSource, HttpSdpExchange};
