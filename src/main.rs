use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;

use pow_ledger::api::{self, AppState};
use pow_ledger::config::Config;
use pow_ledger::controller::ChainController;
use pow_ledger::store::FileChainStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env();
    info!(
        "chain store at {}, difficulty {}",
        config.store_path.display(),
        config.difficulty
    );

    let store = FileChainStore::new(config.store_path.clone());
    let controller = ChainController::open(Box::new(store), config.difficulty, config.yield_every);
    let state = web::Data::new(AppState::new(Arc::new(controller)));

    println!(
        "⛓️ Starting ledger API at http://{}:{}",
        config.host, config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
