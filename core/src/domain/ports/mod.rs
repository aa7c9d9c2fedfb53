//! Collaborator interfaces the domain depends on.

mod macros;
pub(crate) use macros::define_port_error;

mod credential_verifier;
mod notification_gateway;
mod persistence_gateway;
mod tag_reader;

pub use credential_verifier::CredentialVerifier;
#[cfg(test)]
pub use credential_verifier::MockCredentialVerifier;
#[cfg(test)]
pub use notification_gateway::MockNotificationGateway;
pub use notification_gateway::{
    FireEvent, FireEventReceiver, FireEventSender, NotificationGateway, NotificationGatewayError,
    fire_channel,
};
#[cfg(test)]
pub use persistence_gateway::MockPersistenceGateway;
pub use persistence_gateway::{CollectionKey, PersistenceError, PersistenceGateway};
#[cfg(test)]
pub use tag_reader::MockTagReader;
pub use tag_reader::{TagReader, TagReaderError};
