// Application layer - Use case interactors

pub mod batch_interactor;
pub mod dispatcher;
pub mod trim_interactor;

// Re-export interactors
pub use batch_interactor::{discover_videos, BatchInteractor};
pub use dispatcher::KeyCommandDispatcher;
pub use trim_interactor::{StopReason, TrimSessionController};
