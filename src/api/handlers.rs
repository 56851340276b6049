use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::schema::BlockView;
use crate::blockchain::chain;
use crate::blockchain::{
    Address, Block, Blockchain, BlockchainError, DigitalSignature, Transaction, Wallet,
};

/// Data structure for the blockchain state
pub type BlockchainData = web::Data<Blockchain>;

/// Response for the chain endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The length of the chain
    pub length: usize,

    /// The blocks in the chain
    pub chain: Vec<BlockView>,

    /// Whether the chain is valid
    pub is_valid: bool,
}

/// Response for the create wallet endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    /// The wallet's address
    pub address: String,

    /// The wallet's private key (hex encoded)
    pub private_key: String,
}

/// Request for the send endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct SendRequest {
    /// The payer's private key (hex encoded, used for signing only)
    pub private_key: String,

    /// The payee's identity
    pub payee: String,

    /// The amount to transfer
    pub amount: f64,
}

/// Request for the submit endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct SubmitRequest {
    /// The amount to transfer
    pub amount: f64,

    /// The payer's identity, also used to verify the signature
    pub payer: String,

    /// The payee's identity
    pub payee: String,

    /// Base58 signature over the transaction's canonical encoding
    pub signature: String,
}

/// Response for the send and submit endpoints
#[derive(Serialize, Deserialize, ToSchema)]
pub struct AppendResponse {
    /// The message
    pub message: String,

    /// The newly appended block
    pub block: BlockView,
}

fn error_response(status: StatusCode, message: String) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({ "error": message }))
}

// Reads wait on the chain lock, which a running mine holds, so they also go
// through the blocking pool
fn read_failed(err: actix_web::error::BlockingError) -> HttpResponse {
    error!("Chain read failed: {}", err);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Chain read failed".to_string(),
    )
}

/// Mines on the blocking thread pool so the executor stays responsive
async fn append_blocking<F>(job: F) -> HttpResponse
where
    F: FnOnce() -> Result<Block, BlockchainError> + Send + 'static,
{
    match web::block(job).await {
        Ok(Ok(block)) => HttpResponse::Created().json(AppendResponse {
            message: "Block appended".to_string(),
            block: block.into(),
        }),
        Ok(Err(err)) => error_response(
            StatusCode::BAD_REQUEST,
            format!("Transaction rejected: {}", err),
        ),
        Err(err) => {
            error!("Mining task failed: {}", err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Mining task failed".to_string(),
            )
        }
    }
}

/// Get the full blockchain
///
/// Returns the entire blockchain and its validity status
#[utoipa::path(
    get,
    path = "/api/v1/chain",
    responses(
        (status = 200, description = "Blockchain retrieved successfully", body = ChainResponse)
    )
)]
pub async fn get_chain(blockchain: BlockchainData) -> impl Responder {
    let ledger = blockchain.get_ref().clone();

    let snapshot = web::block(move || {
        let blocks = ledger.get_chain();
        let is_valid = chain::validate_chain(&blocks);

        ChainResponse {
            length: blocks.len(),
            chain: blocks.into_iter().map(BlockView::from).collect(),
            is_valid,
        }
    })
    .await;

    match snapshot {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(err) => read_failed(err),
    }
}

/// Check if the blockchain is valid
///
/// Checks the genesis block and every hash link
#[utoipa::path(
    get,
    path = "/api/v1/validate",
    responses(
        (status = 200, description = "Blockchain validation status", body = bool)
    )
)]
pub async fn validate_chain(blockchain: BlockchainData) -> impl Responder {
    let ledger = blockchain.get_ref().clone();

    match web::block(move || ledger.is_valid()).await {
        Ok(is_valid) => HttpResponse::Ok().json(is_valid),
        Err(err) => read_failed(err),
    }
}

/// Create a new wallet
///
/// Creates a new wallet with a random keypair
///
/// The server does not keep the private key
#[utoipa::path(
    post,
    path = "/api/v1/wallet/new",
    responses(
        (status = 201, description = "Wallet created successfully", body = WalletResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_wallet() -> impl Responder {
    match Wallet::new() {
        Ok(wallet) => HttpResponse::Created().json(WalletResponse {
            address: wallet.address().0.clone(),
            private_key: hex::encode(wallet.export_secret_key()),
        }),
        Err(err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to create wallet: {}", err),
        ),
    }
}

/// Send money from a wallet
///
/// Rebuilds the wallet from its private key, signs the transfer and mines it
#[utoipa::path(
    post,
    path = "/api/v1/transactions/send",
    request_body = SendRequest,
    responses(
        (status = 201, description = "Block appended", body = AppendResponse),
        (status = 400, description = "Invalid key or rejected transaction"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn send_money(
    blockchain: BlockchainData,
    send_req: web::Json<SendRequest>,
) -> impl Responder {
    let send_req = send_req.into_inner();

    let private_key_bytes = match hex::decode(&send_req.private_key) {
        Ok(bytes) => bytes,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid private key format. Must be a hex string.".to_string(),
            );
        }
    };

    let wallet = match Wallet::from_secret_key(&private_key_bytes) {
        Ok(wallet) => wallet,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid private key: {}", err),
            );
        }
    };

    let ledger = blockchain.get_ref().clone();
    let payee = Address(send_req.payee);
    let amount = send_req.amount;

    append_blocking(move || wallet.send_money(&ledger, amount, &payee)).await
}

/// Submit a signed transaction
///
/// Appends a transaction signed outside the server
#[utoipa::path(
    post,
    path = "/api/v1/transactions/submit",
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Block appended", body = AppendResponse),
        (status = 400, description = "Invalid signature or key material"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn submit_transaction(
    blockchain: BlockchainData,
    submit_req: web::Json<SubmitRequest>,
) -> impl Responder {
    let submit_req = submit_req.into_inner();

    let ledger = blockchain.get_ref().clone();
    let payer = Address(submit_req.payer);
    let signature = DigitalSignature(submit_req.signature);
    let transaction = Transaction::new(submit_req.amount, payer.clone(), Address(submit_req.payee));

    append_blocking(move || ledger.append_transaction(transaction, &payer, &signature)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    fn app_data() -> BlockchainData {
        web::Data::new(Blockchain::with_difficulty(1))
    }

    #[actix_web::test]
    async fn test_get_chain_starts_at_genesis() {
        let app = test::init_service(
            App::new()
                .app_data(app_data())
                .configure(crate::api::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/chain").to_request();
        let response: ChainResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(response.length, 1);
        assert!(response.is_valid);
        assert_eq!(response.chain[0].prev_hash, "");
        assert_eq!(response.chain[0].transaction.payee().0, "satoshi");
    }

    #[actix_web::test]
    async fn test_create_wallet_and_send() {
        let data = app_data();
        let app = test::init_service(
            App::new()
                .app_data(data.clone())
                .configure(crate::api::configure_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/v1/wallet/new").to_request();
        let wallet: WalletResponse = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/send")
            .set_json(SendRequest {
                private_key: wallet.private_key,
                payee: "bob".to_string(),
                amount: 42.0,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let tail = data.tail();
        assert_eq!(data.len(), 2);
        assert_eq!(tail.transaction.amount(), 42.0);
        assert_eq!(tail.transaction.payer().0, wallet.address);
    }

    #[actix_web::test]
    async fn test_send_with_bad_key() {
        let app = test::init_service(
            App::new()
                .app_data(app_data())
                .configure(crate::api::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/send")
            .set_json(SendRequest {
                private_key: "zz".to_string(),
                payee: "bob".to_string(),
                amount: 1.0,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_submit_signed_and_forged() {
        let data = app_data();
        let app = test::init_service(
            App::new()
                .app_data(data.clone())
                .configure(crate::api::configure_routes),
        )
        .await;

        let wallet = Wallet::new().unwrap();
        let transaction = Transaction::new(7.0, wallet.address().clone(), Address::from("bob"));
        let signature = wallet.sign(transaction.canonical_encoding().as_bytes());

        let forged = test::TestRequest::post()
            .uri("/api/v1/transactions/submit")
            .set_json(SubmitRequest {
                amount: 700.0,
                payer: wallet.address().0.clone(),
                payee: "bob".to_string(),
                signature: signature.0.clone(),
            })
            .to_request();
        let resp = test::call_service(&app, forged).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(data.len(), 1);

        let genuine = test::TestRequest::post()
            .uri("/api/v1/transactions/submit")
            .set_json(SubmitRequest {
                amount: 7.0,
                payer: wallet.address().0.clone(),
                payee: "bob".to_string(),
                signature: signature.0,
            })
            .to_request();
        let response: AppendResponse = test::call_and_read_body_json(&app, genuine).await;
        assert_eq!(response.block.transaction.amount(), 7.0);
        assert_eq!(data.len(), 2);

        let req = test::TestRequest::get().uri("/api/v1/validate").to_request();
        let valid: bool = test::call_and_read_body_json(&app, req).await;
        assert!(valid);
    }

    #[actix_web::test]
    async fn test_reads_during_mining_see_a_linked_chain() {
        let data = web::Data::new(Blockchain::new());
        let app = test::init_service(
            App::new()
                .app_data(data.clone())
                .configure(crate::api::configure_routes),
        )
        .await;

        let ledger = data.get_ref().clone();
        let miner = std::thread::spawn(move || {
            let wallet = Wallet::new().unwrap();
            wallet.send_money(&ledger, 3.0, &Address::from("bob")).unwrap();
        });

        let req = test::TestRequest::get().uri("/api/v1/chain").to_request();
        let response: ChainResponse = test::call_and_read_body_json(&app, req).await;
        assert!(response.is_valid);
        assert_eq!(response.length, response.chain.len());
        assert!(response.length == 1 || response.length == 2);

        miner.join().unwrap();

        let req = test::TestRequest::get().uri("/api/v1/validate").to_request();
        let valid: bool = test::call_and_read_body_json(&app, req).await;
        assert!(valid);
        assert_eq!(data.len(), 2);
    }
}
