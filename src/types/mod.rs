//! Core types exchanged with the run and message services.

pub mod message;
pub mod options;
pub mod run;
pub mod stream;

pub use message::*;
pub use options::*;
pub use run::*;
pub use stream::*;
