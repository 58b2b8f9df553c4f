use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use super::{
    config::{Config, StoreBackend},
    counter::{CounterStore, RecordCounter, RedisCounter},
    database::{MemoryStore, RecordStore, RedisStore, init_redis},
    error::StoreError,
    ids::IdGenerator,
    mail::{HttpMailer, LogMailer, Mailer},
    notify::{Dispatcher, Endpoint},
    services::{ClubService, Context, EventService, TagService, UserService},
};

pub struct AppState {
    pub config: Config,
    pub mailer: Arc<dyn Mailer>,
    pub clubs: ClubService,
    pub events: EventService,
    pub users: UserService,
    pub tags: TagService,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>, StoreError> {
        let (store, counters): (Arc<dyn RecordStore>, Arc<dyn CounterStore>) = match config.store
        {
            StoreBackend::Memory => {
                info!("Using in-memory record store");
                let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
                (store.clone(), Arc::new(RecordCounter::new(store)))
            }
            StoreBackend::Redis => {
                let connection = init_redis(&config.redis_url).await?;
                (
                    Arc::new(RedisStore::new(connection.clone())),
                    Arc::new(RedisCounter::new(connection)),
                )
            }
        };

        let client = Client::new();
        let endpoint = Endpoint::from_outputs_file(&config.outputs_path);

        let mailer: Arc<dyn Mailer> = match &config.mail_api {
            Some(api) => Arc::new(HttpMailer::new(
                client.clone(),
                api.url.clone(),
                api.key.clone(),
            )),
            None => Arc::new(LogMailer),
        };

        let ctx = Context {
            store,
            ids: Arc::new(IdGenerator::new(counters)),
            dispatcher: Arc::new(Dispatcher::relay(endpoint, client)),
        };

        Ok(Self::with_parts(config, ctx, mailer))
    }

    pub fn with_parts(config: Config, ctx: Context, mailer: Arc<dyn Mailer>) -> Arc<Self> {
        Arc::new(Self {
            config,
            mailer,
            clubs: ClubService::new(ctx.clone()),
            events: EventService::new(ctx.clone()),
            users: UserService::new(ctx.clone()),
            tags: TagService::new(ctx),
        })
    }
}
