use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use gtk4::glib;
use gtk4::prelude::*;

use scribe_core::layout::{DividerEcho, LayoutEvent, LayoutSync, Relayout};
use scribe_core::SplitMode;

use crate::editor_webview::EditorHandle;

/// Drives `LayoutSync` from GTK signals and applies relayouts to the paned.
pub(crate) struct LayoutDriver {
    sync: RefCell<LayoutSync>,
    timer: RefCell<Option<glib::SourceId>>,
    /// Orientation and visibility the divider was last positioned for.
    sized_for: Cell<Option<(SplitMode, bool)>>,
    echo: Cell<DividerEcho>,
    paned: gtk4::Paned,
    preview: gtk4::Widget,
    editor: Rc<EditorHandle>,
}

impl LayoutDriver {
    pub(crate) fn new(
        mode: SplitMode,
        preview_visible: bool,
        paned: gtk4::Paned,
        preview: gtk4::Widget,
        editor: Rc<EditorHandle>,
    ) -> Rc<Self> {
        Rc::new(LayoutDriver {
            sync: RefCell::new(LayoutSync::new(mode, preview_visible)),
            timer: RefCell::new(None),
            sized_for: Cell::new(None),
            echo: Cell::new(DividerEcho::default()),
            paned,
            preview,
            editor,
        })
    }

    pub(crate) fn notify(self: &Rc<Self>, event: LayoutEvent) {
        self.sync.borrow_mut().notify(event, Instant::now());
        self.reschedule();
    }

    /// The paned reported a new divider position.
    pub(crate) fn pane_moved(self: &Rc<Self>) {
        let mut echo = self.echo.get();
        let user_move = echo.is_user_move(self.paned.position());
        self.echo.set(echo);
        if user_move {
            self.notify(LayoutEvent::PaneDragged);
        }
    }

    pub(crate) fn relayout_count(&self) -> u64 {
        self.sync.borrow().relayout_count()
    }

    fn reschedule(self: &Rc<Self>) {
        if let Some(id) = self.timer.borrow_mut().take() {
            id.remove();
        }
        let Some(deadline) = self.sync.borrow().next_deadline() else {
            return;
        };
        let delay = deadline.saturating_duration_since(Instant::now());
        let this = Rc::downgrade(self);
        let id = glib::timeout_add_local_once(delay, move || {
            let Some(this) = this.upgrade() else {
                return;
            };
            // This source is finished; forget it before anything can reschedule
            this.timer.borrow_mut().take();
            let relayout = this.sync.borrow_mut().poll(Instant::now());
            if let Some(relayout) = relayout {
                this.apply(&relayout);
            }
            this.reschedule();
        });
        *self.timer.borrow_mut() = Some(id);
    }

    fn apply(&self, relayout: &Relayout) {
        let orientation = match relayout.mode {
            SplitMode::Horizontal => gtk4::Orientation::Horizontal,
            SplitMode::Vertical => gtk4::Orientation::Vertical,
        };
        if self.paned.orientation() != orientation {
            self.paned.set_orientation(orientation);
        }
        self.preview.set_visible(relayout.preview_visible);

        // Keep a user-dragged divider unless the arrangement itself changed
        let key = (relayout.mode, relayout.preview_visible);
        if self.sized_for.get() != Some(key) {
            let total = match relayout.mode {
                SplitMode::Horizontal => self.paned.width(),
                SplitMode::Vertical => self.paned.height(),
            };
            if total > 0 {
                let position = total * i32::from(relayout.editor_percent) / 100;
                let mut echo = self.echo.get();
                echo.expect(position);
                self.echo.set(echo);
                self.paned.set_position(position);
                self.sized_for.set(Some(key));
            }
        }

        log::debug!(
            "relayout #{}: {:?} {}/{}",
            self.relayout_count(),
            relayout.mode,
            relayout.editor_percent,
            relayout.preview_percent
        );
        self.editor.relayout();
    }
}
