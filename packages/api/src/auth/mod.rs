//! Magic-link authentication against the hosted auth service.

mod callback;
mod endpoints;
mod session;

pub use callback::{parse_callback, CallbackTokens};
pub use endpoints::AuthApi;
pub use session::{SessionStorage, TokenResponse};
