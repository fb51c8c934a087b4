/// Authentication and authorization for TaskHub
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength validation
/// - [`jwt`]: Bearer token issuing and verification (the token service)
/// - [`authorization`]: Pure access-control evaluator over membership and
///   global roles
/// - [`middleware`]: Axum request authentication (the bearer/cookie gate)
///
/// # Design notes
///
/// Tokens embed a snapshot of the user's role at issue time, but no
/// authorization decision is made from that snapshot: the middleware
/// re-fetches the live user row and the evaluator only sees live values.
/// A role change or deactivation therefore takes effect on the next
/// request even while an older token is still within its lifetime.

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
