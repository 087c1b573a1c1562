use std::sync::Arc;

use db::DBService;
use services::services::{
    config::Config,
    mailbox::MailboxService,
    storage::ImageStorage,
};

pub mod error;
pub mod http;
pub mod routes;
pub mod views;

#[cfg(test)]
pub mod test_support;

/// Shared handles threaded through every handler. Cloning is cheap: the
/// pool, config and storage root are all reference-counted or small.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    config: Arc<Config>,
    storage: ImageStorage,
    mailbox: MailboxService,
}

impl AppState {
    pub fn new(db: DBService, config: Config, storage: ImageStorage) -> Self {
        let mailbox = MailboxService::new(
            config.mailbox.clone(),
            config.addresses.clone(),
            storage.clone(),
        );
        Self {
            db,
            config: Arc::new(config),
            storage,
            mailbox,
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &ImageStorage {
        &self.storage
    }

    pub fn mailbox(&self) -> &MailboxService {
        &self.mailbox
    }
}
