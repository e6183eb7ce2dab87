//! Runs a single member search from configuration and prints the page as JSON.

use std::env;

use config::Config;
use dotenvy::dotenv;

use member_search::db::establish_connection_pool_with;
use member_search::models::config::AppConfig;
use member_search::repository::DieselRepository;
use member_search::services::member::search_members;

fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Select config profile (defaults to `local`).
    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    let settings = Config::builder()
        // Add `./config/default.yaml`
        .add_source(config::File::with_name("config/default"))
        // Add environment-specific overrides
        .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
        // Add settings from the environment (with a prefix of APP)
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build();

    let settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Error loading settings: {}", err);
            std::process::exit(1);
        }
    };

    let app_config = match settings.try_deserialize::<AppConfig>() {
        Ok(app_config) => app_config,
        Err(err) => {
            log::error!("Error loading app config: {}", err);
            std::process::exit(1);
        }
    };

    let pool = match establish_connection_pool_with(
        &app_config.database_url,
        app_config.connection_options(),
    ) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let repo = DieselRepository::new(pool);

    let ctx = app_config.query_context();

    let page = match search_members(&repo, &app_config.search, &app_config.page, &ctx) {
        Ok(page) => page,
        Err(e) => {
            log::error!("Member search failed: {e}");
            std::process::exit(1);
        }
    };

    log::info!(
        "Found {} members, showing {} from offset {}",
        page.total,
        page.content.len(),
        page.offset
    );

    match serde_json::to_string_pretty(&page) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            log::error!("Failed to serialize page: {e}");
            std::process::exit(1);
        }
    }
}
