//! Split-pane layout synchronization between the editor and the preview.
//!
//! Every layout-affecting notification re-arms a single debounce deadline, so a
//! burst of resize events collapses into one relayout once things go quiet.
//! An orientation change additionally suspends observation until the
//! transition has settled; intermediate sizes produced by the transition itself
//! are ignored and a relayout is always issued at the settle point.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Below this window width the default pane split favours the editor less.
const SMALL_SCREEN_WIDTH: i32 = 1024;

/// Orientation of the editor/preview split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Editor and preview side by side.
    #[default]
    Horizontal,
    /// Editor above preview.
    Vertical,
}

impl SplitMode {
    pub fn toggled(self) -> SplitMode {
        match self {
            SplitMode::Horizontal => SplitMode::Vertical,
            SplitMode::Vertical => SplitMode::Horizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEvent {
    /// The user dragged the divider.
    PaneDragged,
    /// The host window changed size.
    WindowResized { width: i32, height: i32 },
    /// The preview pane was shown or hidden.
    PreviewToggled(bool),
    /// The split orientation changed.
    OrientationChanged(SplitMode),
}

/// One downstream relayout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relayout {
    pub mode: SplitMode,
    pub editor_percent: u8,
    pub preview_percent: u8,
    pub preview_visible: bool,
}

/// Default `(editor, preview)` percentages for a window width and orientation.
pub fn default_sizes(window_width: i32, mode: SplitMode) -> (u8, u8) {
    let small = window_width < SMALL_SCREEN_WIDTH;
    match (small, mode) {
        (true, SplitMode::Horizontal) => (50, 50),
        (true, SplitMode::Vertical) => (60, 40),
        (false, SplitMode::Horizontal) => (60, 40),
        (false, SplitMode::Vertical) => (50, 50),
    }
}

pub struct LayoutSync {
    debounce: Duration,
    settle: Duration,
    mode: SplitMode,
    preview_visible: bool,
    window_size: Option<(i32, i32)>,
    /// When set, a relayout is due at this instant.
    deadline: Option<Instant>,
    /// Observation is suspended until this instant (orientation transition).
    suspended_until: Option<Instant>,
    relayouts: u64,
}

impl LayoutSync {
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);
    pub const DEFAULT_SETTLE: Duration = Duration::from_millis(300);

    pub fn new(mode: SplitMode, preview_visible: bool) -> Self {
        Self::with_timings(
            mode,
            preview_visible,
            Self::DEFAULT_DEBOUNCE,
            Self::DEFAULT_SETTLE,
        )
    }

    pub fn with_timings(
        mode: SplitMode,
        preview_visible: bool,
        debounce: Duration,
        settle: Duration,
    ) -> Self {
        LayoutSync {
            debounce,
            settle,
            mode,
            preview_visible,
            window_size: None,
            deadline: None,
            suspended_until: None,
            relayouts: 0,
        }
    }

    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    pub fn preview_visible(&self) -> bool {
        self.preview_visible
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended_until.is_some()
    }

    pub fn relayout_count(&self) -> u64 {
        self.relayouts
    }

    /// Record a layout-affecting event observed at `now`.
    pub fn notify(&mut self, event: LayoutEvent, now: Instant) {
        match event {
            LayoutEvent::OrientationChanged(mode) => {
                self.mode = mode;
                let settle_at = now + self.settle;
                self.suspended_until = Some(settle_at);
                self.deadline = Some(settle_at);
                log::debug!("split orientation -> {:?}, observation suspended", mode);
                return;
            }
            LayoutEvent::PreviewToggled(visible) => {
                if self.preview_visible == visible {
                    return;
                }
                self.preview_visible = visible;
            }
            LayoutEvent::WindowResized { width, height } => {
                if self.window_size == Some((width, height)) {
                    return;
                }
                self.window_size = Some((width, height));
            }
            LayoutEvent::PaneDragged => {}
        }

        // During a transition the settle deadline already covers this event.
        if self.suspended_until.is_some() {
            return;
        }
        self.deadline = Some(now + self.debounce);
    }

    /// When the event loop should next call [`poll`](Self::poll).
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Emit the pending relayout if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<Relayout> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        if self.suspended_until.take().is_some() {
            log::debug!("split transition settled, observation re-armed");
        }
        self.relayouts += 1;
        Some(self.current())
    }

    /// The layout that would be applied right now.
    pub fn current(&self) -> Relayout {
        let width = self.window_size.map(|(w, _)| w).unwrap_or(SMALL_SCREEN_WIDTH);
        let (editor, preview) = if self.preview_visible {
            default_sizes(width, self.mode)
        } else {
            (100, 0)
        };
        Relayout {
            mode: self.mode,
            editor_percent: editor,
            preview_percent: preview,
            preview_visible: self.preview_visible,
        }
    }
}

/// Tells divider moves caused by applying a relayout apart from user drags,
/// so a relayout does not schedule another one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DividerEcho {
    expected: Option<i32>,
}

impl DividerEcho {
    /// Record a divider position about to be set programmatically.
    pub fn expect(&mut self, position: i32) {
        self.expected = Some(position);
    }

    /// Classify an observed divider position; true means the user moved it.
    pub fn is_user_move(&mut self, position: i32) -> bool {
        if self.expected == Some(position) {
            return false;
        }
        self.expected = None;
        true
    }
}
