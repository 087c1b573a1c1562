use std::future::Future;

use async_imap::Session;
use async_native_tls::{TlsConnector, TlsStream};
use db::DbPool;
use db::models::event::Event;
use db::models::image::{CreateImage, Image};
use futures_util::TryStreamExt;
use thiserror::Error;
use tokio::net::TcpStream;

use super::config::{AddressConfig, MailboxConfig};
use super::storage::{ImageStorage, StorageError};

mod extract;

// Both mail crates run in their runtime-tokio flavor, so the tokio stream
// plugs straight into the TLS connector and the IMAP client.
pub type ImapSession = Session<TlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("Mailbox credentials not configured")]
    NotConfigured,
    #[error("Event not found")]
    EventNotFound,
    #[error("Failed to search emails: {0}")]
    Search(String),
    #[error("Mailbox operation timed out")]
    Timeout,
    #[error("{0}")]
    Backend(String),
    #[error(transparent)]
    Database(#[from] db::DbErr),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl MailboxError {
    /// Short form suitable for a flash message. Detail stays in logs.
    pub fn user_message(&self) -> String {
        match self {
            MailboxError::Search(_) => "Failed to search emails".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MailboxError>;

/// Tally of one ingestion pass over the shared inbox.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub messages_seen: usize,
    pub images_stored: usize,
    pub messages_expunged: usize,
}

/// Pulls image attachments for one event out of the shared IMAP inbox and
/// into storage plus the images table. Messages that yielded at least one
/// stored image are expunged, which is what keeps repeat passes from
/// re-importing them.
#[derive(Clone)]
pub struct MailboxService {
    config: MailboxConfig,
    addresses: AddressConfig,
    storage: ImageStorage,
}

impl MailboxService {
    pub fn new(
        config: MailboxConfig,
        addresses: AddressConfig,
        storage: ImageStorage,
    ) -> MailboxService {
        MailboxService {
            config,
            addresses,
            storage,
        }
    }

    /// One full pass for `event_key`: connect, search, store, expunge. An
    /// empty search result is a successful no-op and skips the event lookup
    /// entirely.
    pub async fn ingest(&self, pool: &DbPool, event_key: &str) -> Result<IngestOutcome> {
        let (user, password) = self.config.credentials().ok_or(MailboxError::NotConfigured)?;
        let mut session = self.connect(user, password).await?;
        let outcome = self.ingest_with_session(pool, &mut session, event_key).await;
        // Polite teardown only; the interesting work already happened.
        tokio::time::timeout(self.config.timeout, session.logout())
            .await
            .ok();
        outcome
    }

    async fn connect(&self, user: &str, password: &str) -> Result<ImapSession> {
        let host = self.config.host.as_str();
        let port = self.config.port;
        tracing::debug!("Connecting to IMAP server {}:{}", host, port);

        let tcp = self
            .with_timeout(TcpStream::connect((host, port)))
            .await?
            .map_err(|e| MailboxError::Backend(format!("TCP connection failed: {}", e)))?;

        let tls_stream = self
            .with_timeout(TlsConnector::new().connect(host, tcp))
            .await?
            .map_err(|e| MailboxError::Backend(format!("TLS handshake failed: {}", e)))?;

        let client = async_imap::Client::new(tls_stream);
        let session = self
            .with_timeout(client.login(user, password))
            .await?
            .map_err(|(e, _)| MailboxError::Backend(format!("IMAP login failed: {}", e)))?;

        Ok(session)
    }

    async fn ingest_with_session(
        &self,
        pool: &DbPool,
        session: &mut ImapSession,
        event_key: &str,
    ) -> Result<IngestOutcome> {
        self.with_timeout(session.select("INBOX"))
            .await?
            .map_err(|e| MailboxError::Backend(format!("SELECT failed: {}", e)))?;

        let address = self.addresses.collection_address(event_key);
        let query = format!("TO \"{}\"", address);
        let found = self
            .with_timeout(session.search(&query))
            .await?
            .map_err(|e| MailboxError::Search(e.to_string()))?;

        let mut outcome = IngestOutcome::default();
        if found.is_empty() {
            return Ok(outcome);
        }

        let event = Event::find_by_key(pool, event_key)
            .await?
            .ok_or(MailboxError::EventNotFound)?;

        let mut sequence: Vec<u32> = found.into_iter().collect();
        sequence.sort_unstable();

        let mut tallies = Vec::new();
        for seq in sequence {
            let raw = match self.fetch_message(session, seq).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(MailboxError::Timeout) => return Err(MailboxError::Timeout),
                Err(err) => {
                    tracing::warn!("Skipping message {}: {}", seq, err);
                    continue;
                }
            };
            outcome.messages_seen += 1;

            let stored = self.store_message(pool, &event, seq, &raw).await?;
            outcome.images_stored += stored;
            tallies.push((seq, stored));
        }

        let to_delete = expungeable(&tallies);
        if !to_delete.is_empty() {
            self.delete_messages(session, &to_delete).await?;
            outcome.messages_expunged = to_delete.len();
        }

        tracing::info!(
            "Mailbox pass for {}: {} message(s) seen, {} image(s) stored, {} expunged",
            address,
            outcome.messages_seen,
            outcome.images_stored,
            outcome.messages_expunged
        );
        Ok(outcome)
    }

    async fn fetch_message(
        &self,
        session: &mut ImapSession,
        seq: u32,
    ) -> Result<Option<Vec<u8>>> {
        let items = self
            .with_timeout(async {
                let stream = session.fetch(seq.to_string(), "(RFC822)").await?;
                stream.try_collect::<Vec<_>>().await
            })
            .await?
            .map_err(|e| MailboxError::Backend(format!("FETCH failed: {}", e)))?;

        Ok(items
            .into_iter()
            .find_map(|fetch| fetch.body().map(|body| body.to_vec())))
    }

    /// Parses one raw message and stores every qualifying attachment,
    /// reporting how many landed. A message that parses badly or carries
    /// nothing usable stores zero, and zero keeps it out of the expunge
    /// set.
    async fn store_message(
        &self,
        pool: &DbPool,
        event: &Event,
        seq: u32,
        raw: &[u8],
    ) -> Result<usize> {
        let message = match extract::extract_message(raw) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!("Skipping unparseable message {}: {}", seq, err);
                return Ok(0);
            }
        };
        self.store_attachments(pool, event, message).await
    }

    async fn store_attachments(
        &self,
        pool: &DbPool,
        event: &Event,
        message: extract::ExtractedMessage,
    ) -> Result<usize> {
        let mut stored = 0;
        for attachment in message.attachments {
            let file_name = self.storage.unique_name(&attachment.original_name);
            self.storage.write(&file_name, &attachment.data)?;
            Image::create(
                pool,
                &CreateImage {
                    file_name,
                    original_name: attachment.original_name,
                    sender: message.sender.clone(),
                    event_id: event.id,
                },
            )
            .await?;
            stored += 1;
        }
        Ok(stored)
    }

    /// Marks the given messages `\Deleted` and expunges in one go. Only
    /// called for messages whose images are already on disk and in the
    /// database, so a crash before this point re-imports rather than loses.
    async fn delete_messages(&self, session: &mut ImapSession, sequence: &[u32]) -> Result<()> {
        let set = sequence
            .iter()
            .map(|seq| seq.to_string())
            .collect::<Vec<_>>()
            .join(",");

        self.with_timeout(async {
            let stream = session.store(&set, "+FLAGS (\\Deleted)").await?;
            stream.try_collect::<Vec<_>>().await
        })
        .await?
        .map_err(|e| MailboxError::Backend(format!("STORE failed: {}", e)))?;

        self.with_timeout(async {
            let stream = session.expunge().await?;
            stream.try_collect::<Vec<_>>().await
        })
        .await?
        .map_err(|e| MailboxError::Backend(format!("EXPUNGE failed: {}", e)))?;

        Ok(())
    }

    async fn with_timeout<F: Future>(&self, fut: F) -> Result<F::Output> {
        tokio::time::timeout(self.config.timeout, fut)
            .await
            .map_err(|_| MailboxError::Timeout)
    }
}

/// A message may leave the mailbox only if it contributed at least one
/// stored image. Everything else stays put for the next pass.
fn expungeable(tallies: &[(u32, usize)]) -> Vec<u32> {
    tallies
        .iter()
        .filter(|(_, stored)| *stored > 0)
        .map(|(seq, _)| *seq)
        .collect()
}
