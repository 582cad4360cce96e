use axum::Router;

/// A service module that contributes HTTP routes.
///
/// Each business module (customer, worklog, holiday, ...) implements this
/// trait to register its API endpoints. The server binary collects all
/// modules and nests their routes under `/api`.
pub trait Module: Send + Sync {
    /// Module name, used for logging.
    fn name(&self) -> &str;

    /// Return the module's routes, relative to `/api` (e.g. `/customers/{id}`).
    fn routes(&self) -> Router;
}
