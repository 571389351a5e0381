/// Middleware modules for the API server
///
/// - `guard`: identity and policy checks per entity router
/// - `request_id`: request id generation and the HTTP span

pub mod guard;
pub mod request_id;
