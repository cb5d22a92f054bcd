pub mod assets;
pub mod bridge;
pub mod css;
pub mod host;
pub mod preview;
pub mod protocol;
pub mod session;
pub mod syntax;

pub use bridge::{Bridge, BridgeError, Transport};
pub use host::{HostRouter, HostWindow};
pub use session::{Session, SessionAction};
