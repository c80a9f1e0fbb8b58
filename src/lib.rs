pub mod block;
#[cfg(feature = "cli")]
pub mod cli;
pub mod clipboard;
pub mod error;
pub mod events;
pub mod registry;
pub mod render;

pub use block::{Block, Field, Input, VariableModel, Workspace};
pub use error::{Error, Result};
pub use events::{Event, EventPayload, UndoHistory};
pub use render::{RenderInfo, Renderer};

#[cfg(feature = "cli")]
pub use cli::run;
