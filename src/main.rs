use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use log::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod blockchain;
mod config;

use config::Config;

// Move value between two fresh wallets so the chain has something to show
fn run_demo(blockchain: &blockchain::Blockchain) {
    let wallets = blockchain::Wallet::new().and_then(|alice| {
        blockchain::Wallet::new().map(|bob| (alice, bob))
    });

    let (alice, bob) = match wallets {
        Ok(wallets) => wallets,
        Err(err) => {
            warn!("Failed to create demo wallets: {}", err);
            return;
        }
    };

    match alice.send_money(blockchain, 42.0, bob.address()) {
        Ok(block) => info!(
            "Demo transfer mined with nonce {}, chain now holds {} blocks",
            block.nonce,
            blockchain.len()
        ),
        Err(err) => warn!("Demo transfer rejected: {}", err),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::get_chain,
        api::handlers::validate_chain,
        api::handlers::create_wallet,
        api::handlers::send_money,
        api::handlers::submit_transaction
    ),
    components(
        schemas(
            blockchain::Transaction,
            blockchain::Address,
            blockchain::DigitalSignature,
            api::schema::BlockView,
            api::handlers::ChainResponse,
            api::handlers::WalletResponse,
            api::handlers::SendRequest,
            api::handlers::SubmitRequest,
            api::handlers::AppendResponse
        )
    ),
    tags(
        (name = "ledger", description = "Ledger API endpoints")
    ),
    info(
        title = "Proof-of-work Ledger API",
        version = "0.1.0",
        description = "A signed, proof-of-work ledger",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::parse();

    let blockchain = blockchain::Blockchain::with_difficulty(config.difficulty);
    info!(
        "Created ledger with genesis block {} (difficulty {})",
        blockchain.tail().compute_hash(),
        blockchain.difficulty()
    );

    if config.demo {
        run_demo(&blockchain);
    }

    let blockchain = web::Data::new(blockchain);

    info!("Starting HTTP server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let openapi = ApiDoc::openapi();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(blockchain.clone())
            .configure(api::configure_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
