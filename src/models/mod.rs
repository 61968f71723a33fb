pub mod task;
pub mod token;
pub mod user;

pub use task::{NewTask, Task, TaskStatus, TaskUpdate};
pub use token::TokenPair;
pub use user::{CurrentUser, LoginRequest, RegistrationRequest};
