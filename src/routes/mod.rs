/// Router Module Index
///
/// Organizes the application's routing logic into access-segregated modules,
/// so that the authentication requirement is applied explicitly at the module
/// level (via an Axum route layer) rather than remembered per handler.

/// Routes accessible to all clients (registration, login, public listing).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated bearer token.
pub mod authenticated;
