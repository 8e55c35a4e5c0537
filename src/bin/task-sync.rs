use task_aggregator::{HttpSyncEngine, Settings};
use task_aggregator::engine::sync_progress::feedback_channel;


#[tokio::main]
async fn main() {
    env_logger::init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Invalid settings: {}", err);
            std::process::exit(1);
        },
    };
    let engine = match HttpSyncEngine::from_settings(&settings) {
        Ok(engine) => engine,
        Err(err) => {
            log::error!("Unable to create the HTTP clients: {}", err);
            std::process::exit(1);
        },
    };

    let (sender, mut receiver) = feedback_channel();
    let progress = tokio::spawn(async move {
        while receiver.changed().await.is_ok() {
            log::info!("{}", *receiver.borrow());
        }
    });

    let result = engine.sync_with_feedback(&settings.sync, sender).await;
    let _ = progress.await;

    for error in &result.errors {
        log::warn!("{}", error);
    }
    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(err) => log::error!("Unable to serialize the sync result: {}", err),
    }
}
