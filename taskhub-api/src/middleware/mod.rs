/// API-side middleware
///
/// Request authentication lives in `taskhub_shared::auth::middleware`; this
/// module holds middleware specific to the HTTP edge.

pub mod security;
