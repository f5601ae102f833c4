// LSP protocol layer
// - server.rs: transport setup and lifecycle
// - backend.rs: LanguageServer trait implementation, document store, settings
pub mod backend;
pub mod server;
