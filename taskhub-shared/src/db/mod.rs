/// Database layer for TaskHub
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with a startup health check
///
/// Models live in the `models` module at crate root level.

pub mod pool;
