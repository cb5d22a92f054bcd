use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use scribe_core::{Language, SplitMode};

use crate::syntax::SyntaxRules;

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Named routes the host may use to reach the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InboundChannel {
    ThemeChange,
    CustomImageSelected,
    ResetImage,
    ImageSelectionError,
    FileSaveError,
    FileOpenError,
    NewFile,
    OpenFile,
    SaveFile,
    SplitModeChange,
    FileSaved,
}

impl InboundChannel {
    pub const ALL: [InboundChannel; 11] = [
        InboundChannel::ThemeChange,
        InboundChannel::CustomImageSelected,
        InboundChannel::ResetImage,
        InboundChannel::ImageSelectionError,
        InboundChannel::FileSaveError,
        InboundChannel::FileOpenError,
        InboundChannel::NewFile,
        InboundChannel::OpenFile,
        InboundChannel::SaveFile,
        InboundChannel::SplitModeChange,
        InboundChannel::FileSaved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InboundChannel::ThemeChange => "theme-change",
            InboundChannel::CustomImageSelected => "custom-image-selected",
            InboundChannel::ResetImage => "reset-image",
            InboundChannel::ImageSelectionError => "image-selection-error",
            InboundChannel::FileSaveError => "file-save-error",
            InboundChannel::FileOpenError => "file-open-error",
            InboundChannel::NewFile => "new-file",
            InboundChannel::OpenFile => "open-file",
            InboundChannel::SaveFile => "save-file",
            InboundChannel::SplitModeChange => "split-mode-change",
            InboundChannel::FileSaved => "file-saved",
        }
    }

    pub fn parse(name: &str) -> Option<InboundChannel> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

/// Named routes the UI may use to reach the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutboundChannel {
    ResetImage,
    SaveFile,
    OpenFile,
    NewFile,
    UpdateSplitMode,
}

impl OutboundChannel {
    pub const ALL: [OutboundChannel; 5] = [
        OutboundChannel::ResetImage,
        OutboundChannel::SaveFile,
        OutboundChannel::OpenFile,
        OutboundChannel::NewFile,
        OutboundChannel::UpdateSplitMode,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OutboundChannel::ResetImage => "reset-image",
            OutboundChannel::SaveFile => "save-file",
            OutboundChannel::OpenFile => "open-file",
            OutboundChannel::NewFile => "new-file",
            OutboundChannel::UpdateSplitMode => "update-split-mode",
        }
    }

    pub fn parse(name: &str) -> Option<OutboundChannel> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Request/response channels, reachable only through an invoke.
    pub fn is_invoke(self) -> bool {
        matches!(self, OutboundChannel::SaveFile | OutboundChannel::OpenFile)
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    pub fn from_dark_mode(dark: bool) -> Theme {
        if dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenFileResult {
    pub content: String,
    pub file_path: String,
}

// ---------------------------------------------------------------------------
// Events: host → UI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "kebab-case")]
pub enum InboundEvent {
    ThemeChange { theme: Theme },
    CustomImageSelected { data_url: String },
    ResetImage,
    ImageSelectionError { message: String },
    FileSaveError { message: String },
    FileOpenError { message: String },
    NewFile,
    OpenFile,
    SaveFile,
    SplitModeChange { mode: SplitMode },
    FileSaved { file_path: String },
}

impl InboundEvent {
    pub fn channel(&self) -> InboundChannel {
        match self {
            InboundEvent::ThemeChange { .. } => InboundChannel::ThemeChange,
            InboundEvent::CustomImageSelected { .. } => InboundChannel::CustomImageSelected,
            InboundEvent::ResetImage => InboundChannel::ResetImage,
            InboundEvent::ImageSelectionError { .. } => InboundChannel::ImageSelectionError,
            InboundEvent::FileSaveError { .. } => InboundChannel::FileSaveError,
            InboundEvent::FileOpenError { .. } => InboundChannel::FileOpenError,
            InboundEvent::NewFile => InboundChannel::NewFile,
            InboundEvent::OpenFile => InboundChannel::OpenFile,
            InboundEvent::SaveFile => InboundChannel::SaveFile,
            InboundEvent::SplitModeChange { .. } => InboundChannel::SplitModeChange,
            InboundEvent::FileSaved { .. } => InboundChannel::FileSaved,
        }
    }
}

// ---------------------------------------------------------------------------
// Messages: UI → host
// ---------------------------------------------------------------------------

/// Fire-and-forget messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "kebab-case")]
pub enum OutboundMessage {
    ResetImage,
    NewFile,
    UpdateSplitMode { mode: SplitMode },
}

impl OutboundMessage {
    pub fn channel(&self) -> OutboundChannel {
        match self {
            OutboundMessage::ResetImage => OutboundChannel::ResetImage,
            OutboundMessage::NewFile => OutboundChannel::NewFile,
            OutboundMessage::UpdateSplitMode { .. } => OutboundChannel::UpdateSplitMode,
        }
    }
}

/// Request/response calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "kebab-case")]
pub enum InvokeCall {
    SaveFile {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
    },
    OpenFile,
}

impl InvokeCall {
    pub fn channel(&self) -> OutboundChannel {
        match self {
            InvokeCall::SaveFile { .. } => OutboundChannel::SaveFile,
            InvokeCall::OpenFile => OutboundChannel::OpenFile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum InvokeReply {
    Saved(Option<String>),
    Opened(Option<OpenFileResult>),
    Failed(String),
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Everything the UI side puts on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Envelope {
    Send { message: OutboundMessage },
    Invoke { request_id: u64, call: InvokeCall },
}

/// Everything the host puts on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostMessage {
    Event { event: InboundEvent },
    Reply { request_id: u64, reply: InvokeReply },
}

impl From<InboundEvent> for HostMessage {
    fn from(event: InboundEvent) -> Self {
        HostMessage::Event { event }
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unauthorized channel: {0}")]
    UnknownChannel(String),
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

fn nested_channel<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field)?.get("channel")?.as_str()
}

/// Decode UI → host traffic, rejecting any channel outside the outbound set.
pub fn parse_envelope(json: &str) -> Result<Envelope, ProtocolError> {
    let value: Value = serde_json::from_str(json)?;
    let name = nested_channel(&value, "message").or_else(|| nested_channel(&value, "call"));
    if let Some(name) = name {
        if OutboundChannel::parse(name).is_none() {
            return Err(ProtocolError::UnknownChannel(name.to_string()));
        }
    }
    Ok(serde_json::from_value(value)?)
}

/// Decode host → UI traffic, rejecting any channel outside the inbound set.
pub fn parse_host_message(json: &str) -> Result<HostMessage, ProtocolError> {
    let value: Value = serde_json::from_str(json)?;
    if let Some(name) = nested_channel(&value, "event") {
        if InboundChannel::parse(name).is_none() {
            return Err(ProtocolError::UnknownChannel(name.to_string()));
        }
    }
    Ok(serde_json::from_value(value)?)
}

// ---------------------------------------------------------------------------
// Editor widget: host → widget (sent via evaluate_javascript)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EditorCommand {
    /// Replace the buffer. The page echoes `generation` on every edit that
    /// follows, until the next `SetContent`.
    SetContent {
        content: String,
        language: Language,
        syntax: SyntaxRules,
        generation: u32,
    },
    SetLanguage {
        language: Language,
        syntax: SyntaxRules,
    },
    SetTheme {
        theme: Theme,
    },
    SetBackgroundImage {
        data_url: Option<String>,
    },
    Relayout,
}

// ---------------------------------------------------------------------------
// Editor widget: widget → host (sent via postMessage)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EditorEvent {
    Ready,
    ContentChanged {
        content: String,
        generation: u32,
        version: u32,
    },
    SaveRequested,
    OpenRequested,
    NewRequested,
}

/// Orders `ContentChanged` events. Each `SetContent` opens a new generation;
/// edits from an older generation, or repeated versions, are stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentVersion {
    generation: u32,
    version: u32,
}

impl ContentVersion {
    /// Start a new generation for a `SetContent` and return its number.
    pub fn next_generation(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.version = 0;
        self.generation
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Record an edit event; false if it is stale.
    pub fn accept(&mut self, generation: u32, version: u32) -> bool {
        if generation != self.generation || version <= self.version {
            return false;
        }
        self.version = version;
        true
    }
}
