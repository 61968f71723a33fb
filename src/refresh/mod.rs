pub mod coordinator;

pub use coordinator::{LogoutHandle, RefreshCoordinator};
