use std::path::PathBuf;

use gtk4::gio;
use gtk4::glib;
use gtk4::prelude::*;
use libadwaita as adw;
use tokio::sync::mpsc::UnboundedSender;

use scribe_core::files::{FileError, FileFilter, OpenDialogOptions, SaveDialogOptions};
use scribe_editor::protocol::{Envelope, HostMessage, InboundEvent};
use scribe_editor::{HostWindow, Transport};

/// The application window as seen by the host side: native dialogs plus an
/// outbound queue towards the UI side.
pub(crate) struct GtkHostWindow {
    window: glib::WeakRef<adw::ApplicationWindow>,
    to_ui: UnboundedSender<HostMessage>,
}

impl GtkHostWindow {
    pub(crate) fn new(window: &adw::ApplicationWindow, to_ui: UnboundedSender<HostMessage>) -> Self {
        GtkHostWindow {
            window: window.downgrade(),
            to_ui,
        }
    }

    fn parent(&self) -> Option<adw::ApplicationWindow> {
        self.window.upgrade().filter(|w| w.is_visible())
    }
}

fn filter_list(filters: &[FileFilter]) -> gio::ListStore {
    let store = gio::ListStore::new::<gtk4::FileFilter>();
    for f in filters {
        let filter = gtk4::FileFilter::new();
        filter.set_name(Some(&f.name));
        if f.is_wildcard() {
            filter.add_pattern("*");
        } else {
            for ext in &f.extensions {
                filter.add_suffix(ext);
            }
        }
        store.append(&filter);
    }
    store
}

/// Map a finished `FileDialog` to a path. Only a user dismissal counts as a
/// cancel; portal failures and non-local picks are errors.
fn dialog_path(
    kind: &str,
    result: Result<gio::File, glib::Error>,
) -> Result<Option<PathBuf>, FileError> {
    match result {
        Ok(file) => match file.path() {
            Some(path) => Ok(Some(path)),
            None => Err(FileError::Dialog(format!(
                "{} is not a local file",
                file.uri()
            ))),
        },
        Err(e)
            if e.matches(gtk4::DialogError::Dismissed)
                || e.matches(gtk4::DialogError::Cancelled) =>
        {
            log::debug!("{} dialog dismissed: {}", kind, e);
            Ok(None)
        }
        Err(e) => Err(FileError::Dialog(e.to_string())),
    }
}

impl HostWindow for GtkHostWindow {
    fn is_open(&self) -> bool {
        self.parent().is_some()
    }

    async fn choose_open_path(
        &self,
        options: &OpenDialogOptions,
    ) -> Result<Option<PathBuf>, FileError> {
        let parent = self.parent().ok_or(FileError::InvalidWindow)?;
        let dialog = gtk4::FileDialog::builder()
            .title(options.title.as_str())
            .modal(true)
            .filters(&filter_list(&options.filters))
            .build();

        dialog_path("Open", dialog.open_future(Some(&parent)).await)
    }

    async fn choose_save_path(
        &self,
        options: &SaveDialogOptions,
    ) -> Result<Option<PathBuf>, FileError> {
        let parent = self.parent().ok_or(FileError::InvalidWindow)?;
        let dialog = gtk4::FileDialog::builder()
            .title(options.title.as_str())
            .modal(true)
            .initial_name(options.default_name.as_str())
            .filters(&filter_list(&options.filters))
            .build();
        if let Some(dir) = &options.default_dir {
            dialog.set_initial_folder(Some(&gio::File::for_path(dir)));
        }

        dialog_path("Save", dialog.save_future(Some(&parent)).await)
    }

    fn emit(&self, event: InboundEvent) {
        let channel = event.channel().as_str();
        if self.to_ui.send(HostMessage::from(event)).is_err() {
            log::warn!("UI side gone, dropping {}", channel);
        }
    }
}

/// UI side of the in-process wire: envelopes go straight onto the host queue.
pub(crate) struct ChannelTransport {
    to_host: UnboundedSender<Envelope>,
}

impl ChannelTransport {
    pub(crate) fn new(to_host: UnboundedSender<Envelope>) -> Self {
        ChannelTransport { to_host }
    }
}

impl Transport for ChannelTransport {
    fn post(&self, envelope: Envelope) -> Result<(), String> {
        self.to_host
            .send(envelope)
            .map_err(|_| "host channel closed".to_string())
    }
}
