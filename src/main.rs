//! GiftBot Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use teloxide::{prelude::*, types::Update};
use teloxide::dispatching::UpdateHandler;
use tracing::{error, info, warn};

use giftbot::{
    config::Settings,
    database::{connection, UserRepository, UserStore},
    handlers::DialogueEngine,
    middleware::RateLimiter,
    services::ServiceFactory,
    state::ConversationStore,
    transport::{telegram::TelegramTransport, Event, EventKind, Transport},
    models::Profile,
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard must live for the whole process.
    let _logging_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", giftbot::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = connection::create_pool(&settings.database).await?;

    info!("Running database migrations...");
    connection::run_migrations(&db_pool).await?;

    // Initialize bot and services
    let bot = Bot::new(&settings.bot.token);
    let store: Arc<dyn UserStore> = Arc::new(UserRepository::new(db_pool));
    let transport: Arc<dyn Transport> = Arc::new(TelegramTransport::new(bot.clone()));
    let services = ServiceFactory::new(Arc::clone(&store), Arc::clone(&transport), &settings);

    let engine = Arc::new(DialogueEngine::new(
        services.user_service.clone(),
        Arc::clone(&transport),
        ConversationStore::new(),
        RateLimiter::new(&settings.rate_limit),
        settings.bot.secret_word.clone(),
    ));

    // Birthday reminders: one run at startup, then daily at the
    // configured local hour.
    let notifier = services.birthday_notifier.clone();
    let run_hour = settings.notifications.run_hour;
    tokio::spawn(async move {
        if let Err(e) = notifier.notify_upcoming().await {
            error!(error = %e, "Birthday notifier run failed");
        }
        loop {
            tokio::time::sleep(until_next_run(run_hour)).await;
            info!("Running scheduled birthday notifier");
            if let Err(e) = notifier.notify_upcoming().await {
                error!(error = %e, "Birthday notifier run failed");
            }
        }
    });

    // Profile sync on a fixed interval.
    let profile_sync = services.profile_sync.clone();
    let sync_interval = Duration::from_secs(settings.profile_sync.interval_hours * 3600);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(sync_interval).await;
            if let Err(e) = profile_sync.sync_profiles().await {
                error!(error = %e, "Profile sync run failed");
            }
        }
    });

    info!("Setting up bot handlers...");
    let mut dispatcher = Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![engine])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("GiftBot is ready, starting polling...");
    dispatcher.dispatch().await;

    info!("GiftBot has been shut down.");
    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use teloxide::dispatching::UpdateFilterExt;

    dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback_query))
}

async fn handle_message(msg: Message, engine: Arc<DialogueEngine>) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let event = Event {
        chat_id: msg.chat.id.0,
        kind: EventKind::Text(text.to_string()),
        profile: Profile {
            username: msg.chat.username().unwrap_or_default().to_string(),
            first_name: msg.chat.first_name().map(ToOwned::to_owned),
            last_name: msg.chat.last_name().map(ToOwned::to_owned),
        },
    };

    if let Err(e) = engine.handle_event(event).await {
        error!(chat_id = msg.chat.id.0, error = %e, "Error handling message");
    }
    Ok(())
}

async fn handle_callback_query(query: CallbackQuery, engine: Arc<DialogueEngine>) -> HandlerResult {
    let Some(data) = query.data else {
        return Ok(());
    };
    let Some(message) = query.message else {
        return Ok(());
    };

    let chat_id = message.chat().id.0;
    let event = Event {
        chat_id,
        kind: EventKind::Callback {
            id: query.id,
            data,
            message_id: message.id().0,
        },
        profile: Profile {
            username: query.from.username.clone().unwrap_or_default(),
            first_name: Some(query.from.first_name.clone()),
            last_name: query.from.last_name.clone(),
        },
    };

    if let Err(e) = engine.handle_event(event).await {
        error!(chat_id = chat_id, error = %e, "Error handling callback query");
    }
    Ok(())
}

/// Time left until the next daily run at `hour` local time.
fn until_next_run(hour: u32) -> Duration {
    let now = Local::now().naive_local();
    // `hour` is validated at startup, but fall back to a day rather than
    // panic inside the scheduler task.
    let Some(today) = now.date().and_hms_opt(hour, 0, 0) else {
        return Duration::from_secs(24 * 3600);
    };
    let next = if now >= today {
        today + chrono::Duration::days(1)
    } else {
        today
    };
    (next - now).to_std().unwrap_or_default()
}
