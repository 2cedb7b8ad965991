//! Client for the task-tracking backend.
//!
//! A [`PageController`] turns user actions ([`Command`]) into calls against the
//! REST endpoints and keeps the rendered task list in step with the server.
//! Every mutation is followed by a full reload of the list.
//!
//! ```no_run
//! use todo_web_client::{BasicAuth, ClientConfig, Command, FileStore, PageController, TaskApi};
//!
//! # async fn run() -> Result<(), todo_web_client::ClientError> {
//! let config = ClientConfig::load();
//! let page = PageController::new(
//!     TaskApi::new(&config.api_url),
//!     BasicAuth::new(FileStore::new(&config.auth_file)),
//!     &config,
//! );
//! page.dispatch(Command::Refresh).await?;
//! for item in page.rendered() {
//!     println!("{} {}", item.id, item.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod model;
pub mod schema;
pub mod storage;
pub mod view;

pub use api::TaskApi;
pub use auth::{AuthProvider, BasicAuth, Credential};
pub use config::ClientConfig;
pub use error::ClientError;
pub use handler::{Command, Effects, PageController};
pub use model::{Task, TaskId};
pub use schema::{LoginSchema, RegisterSchema, UpdateTaskSchema};
pub use storage::{CredentialStore, FileStore, MemoryStore};
pub use view::{Alert, AlertKind, Navigation, Page, TaskItem};
