//! Directory creation and file removal with classified, attribute-rich
//! failures that render through a message catalog.
//!
//! ```no_run
//! use osfiles::{ErrorContext, Files, DEFAULT_MODE};
//!
//! let files = Files::new(ErrorContext::default());
//! if let Err(failure) = files.makedirs("/tmp/osfiles/a/b", DEFAULT_MODE) {
//!     eprintln!("{}", files.context().template_text(&failure));
//! }
//! ```

pub mod config;
pub mod context;
pub mod failure;
pub mod files;
pub mod kind;
pub mod logger;
pub mod message;
pub mod translate;

pub use context::ErrorContext;
pub use failure::{Attribute, AttributeValue, Failure, Outcome};
pub use files::{makedirs, mkdir, parent_path, remove, Files, Mode, DEFAULT_MODE};
pub use kind::ErrorKind;
pub use message::{Catalog, MessageError, TemplateSource};
