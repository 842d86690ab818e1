//! Request dispatch: one request in, one decoded outcome out

mod dispatcher;
mod request;

pub use dispatcher::Dispatcher;
pub use request::{Decoder, Request};
pub(crate) use request::{Completion, RequestDescriptor};
