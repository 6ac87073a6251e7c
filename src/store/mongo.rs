//! # Connection Manager
//!
//! Owns the MongoDB/DocumentDB connection pool.
//!
//! ## Dial Parameters
//!
//! | Setting | MongoDB | DocumentDB |
//! |---|---|---|
//! | Transport | plaintext | TLS, default trust roots |
//! | Port | driver default or `host:port` | 27017 |
//! | Auth source | database name | database name |
//! | Connect / selection timeout | 10 s | 10 s |
//! | Read preference | `primaryPreferred` | `primaryPreferred` |
//! | Retryable writes | off | off (not supported) |
//!
//! Sessions are causally consistent: within one session reads never go back in
//! time relative to earlier reads and writes of that session, while writes always
//! go to the primary. This is the driver's counterpart of a "monotonic" mode.
//!
//! The pool is bounded by [`ConnectionConfig::pool_limit`]; once exhausted, the
//! driver queues further checkouts.

use crate::config::{Backend, ConnectionConfig};
use crate::store::{Namespace, SessionPool, StoreError, StoreSession};
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::error::{Error as DriverError, ErrorKind, WriteFailure};
use mongodb::options::{
    Acknowledgment, ClientOptions, Credential, ReadPreference, SelectionCriteria, ServerAddress, Tls,
    TlsOptions, WriteConcern,
};
use mongodb::{Client, ClientSession};
use tracing::{debug, info, instrument, warn};

/// The pooled connection to the document database.
///
/// Cloning is cheap; all clones share one driver pool.
#[derive(Clone, Debug)]
pub struct ConnectionManager {
    client: Client,
    backend: Backend,
    address: String,
}

impl ConnectionManager {
    /// Builds the driver options for `config` without touching the network.
    pub fn client_options(config: &ConnectionConfig) -> ClientOptions {
        let mut credential = Credential::default();
        credential.username = Some(config.username.clone());
        credential.password = Some(config.password.expose().to_string());
        credential.source = Some(config.database.clone());

        let tls = if config.tls() {
            Tls::Enabled(TlsOptions::default())
        } else {
            Tls::Disabled
        };

        let mut options = ClientOptions::default();
        options.hosts = vec![ServerAddress::Tcp {
            host: config.host.clone(),
            port: config.port,
        }];
        options.credential = Some(credential);
        options.tls = Some(tls);
        options.connect_timeout = Some(config.dial_timeout);
        options.server_selection_timeout = Some(config.dial_timeout);
        options.max_pool_size = Some(config.pool_limit);
        options.selection_criteria = Some(SelectionCriteria::ReadPreference(
            ReadPreference::PrimaryPreferred { options: None },
        ));
        options.retry_writes = Some(false);
        options.app_name = Some(config.app_name.clone());
        options.default_database = Some(config.database.clone());
        options
    }

    /// Dials the database and verifies the connection with a `ping`.
    ///
    /// There is no retry loop: an error here means the service is not ready and
    /// the caller is expected to terminate.
    #[instrument(
        name = "ConnectionManager::connect",
        skip(config),
        fields(address = %config.address(), backend = %config.backend, tls = config.tls())
    )]
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, StoreError> {
        info!(
            database = %config.database,
            pool_limit = config.pool_limit,
            timeout_ms = config.dial_timeout.as_millis() as u64,
            "Attempting to connect"
        );

        let client = Client::with_options(Self::client_options(config)).map_err(|e| {
            let error = StoreError::from(e);
            warn!(error = %error, "Invalid client options");
            error
        })?;

        if let Err(e) = client.database(&config.database).run_command(doc! { "ping": 1 }).await {
            let error = StoreError::from(e);
            warn!(error = %error, "Can't connect to database");
            return Err(error);
        }

        info!("Connected");
        Ok(Self {
            client,
            backend: config.backend,
            address: config.address(),
        })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }
}

#[async_trait]
impl SessionPool for ConnectionManager {
    type Session = MongoSession;

    async fn borrow_session(&self) -> Result<MongoSession, StoreError> {
        let session = self.client.start_session().causal_consistency(true).await?;
        debug!(address = %self.address, "Session borrowed");
        Ok(MongoSession {
            client: self.client.clone(),
            session,
            acknowledged: true,
        })
    }

    async fn close(&self) {
        info!(address = %self.address, "Closing connection pool");
        self.client.clone().shutdown().await;
    }

    fn describe(&self) -> String {
        format!("{} at {}", self.backend, self.address)
    }
}

/// A causally consistent session borrowed from the [`ConnectionManager`].
///
/// Dropping it ends the logical session and returns it to the driver's pool.
pub struct MongoSession {
    client: Client,
    session: ClientSession,
    acknowledged: bool,
}

impl MongoSession {
    fn unacknowledged() -> WriteConcern {
        let mut write_concern = WriteConcern::default();
        write_concern.w = Some(Acknowledgment::Nodes(0));
        write_concern
    }

    /// Appends `writeConcern: { w: 0 }`, keeping the command name as the first key.
    fn unacknowledged_command(mut command: Document) -> Document {
        command.insert("writeConcern", doc! { "w": 0 });
        command
    }
}

#[async_trait]
impl StoreSession for MongoSession {
    async fn insert_one(&mut self, namespace: &Namespace, document: Document) -> Result<(), StoreError> {
        let collection = self
            .client
            .database(&namespace.database)
            .collection::<Document>(&namespace.collection);

        // Unacknowledged writes cannot be bound to a session.
        if self.acknowledged {
            collection.insert_one(document).session(&mut self.session).await?;
        } else {
            collection
                .insert_one(document)
                .write_concern(Self::unacknowledged())
                .await?;
        }
        Ok(())
    }

    async fn count_documents(&mut self, namespace: &Namespace) -> Result<u64, StoreError> {
        let count = self
            .client
            .database(&namespace.database)
            .collection::<Document>(&namespace.collection)
            .count_documents(doc! {})
            .session(&mut self.session)
            .await?;
        Ok(count)
    }

    async fn run_command(&mut self, database: &str, command: Document) -> Result<Document, StoreError> {
        let database = self.client.database(database);
        let reply = if self.acknowledged {
            database.run_command(command).session(&mut self.session).await?
        } else {
            database.run_command(Self::unacknowledged_command(command)).await?
        };
        Ok(reply)
    }

    fn set_acknowledged(&mut self, acknowledged: bool) {
        self.acknowledged = acknowledged;
    }
}

impl From<DriverError> for StoreError {
    fn from(e: DriverError) -> Self {
        match e.kind.as_ref() {
            ErrorKind::Command(command) => StoreError::CommandRejected {
                code: command.code,
                message: command.message.clone(),
            },
            ErrorKind::Write(WriteFailure::WriteError(write)) => StoreError::CommandRejected {
                code: write.code,
                message: write.message.clone(),
            },
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => StoreError::Unreachable(e.to_string()),
            ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
                StoreError::Encoding(e.to_string())
            }
            _ => StoreError::Driver(e.to_string()),
        }
    }
}
