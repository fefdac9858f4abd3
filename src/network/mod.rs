pub mod api;
pub mod client;
pub mod protocol;
pub mod socket;

pub use api::ApiClient;
pub use client::ApiWorker;
pub use socket::SocketIoTransport;
