//! Development server: serves the expense routes over plain HTTP, forwarding
//! every request through the same router the serverless function uses.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use aws_config::BehaviorVersion;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tracing::info;

use receipts::Settings;
use receipts::domain::ExpenseService;
use receipts::inbound::http::{HttpState, configure};
use receipts::inbound::lambda::ExpenseRouter;
use receipts::outbound::dynamodb::DynamoDbExpenseRepository;
use receipts::outbound::memory::InMemoryExpenseRepository;
use receipts::telemetry;

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    telemetry::init();

    let settings = Settings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let dev_user = settings
        .dev_user()
        .wrap_err("EXPENSES_DEV_USER is not a usable identity")?;
    let router = build_router(&settings).await;
    let state = web::Data::new(HttpState::new(router, dev_user));

    let bind_addr = settings.dev_bind_addr().to_owned();
    info!(
        %bind_addr,
        dynamodb = settings.dev_use_dynamodb,
        "starting development server"
    );
    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(bind_addr.as_str())
        .wrap_err_with(|| format!("failed to bind {bind_addr}"))?
        .run()
        .await
        .wrap_err("development server failed")
}

async fn build_router(settings: &Settings) -> ExpenseRouter {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    if settings.dev_use_dynamodb {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let repo = DynamoDbExpenseRepository::new(
            &sdk_config,
            settings.dynamodb_table(),
            settings.dynamodb_endpoint(),
        );
        let service = Arc::new(ExpenseService::new(Arc::new(repo), clock));
        ExpenseRouter::new(service.clone(), service)
    } else {
        let repo = InMemoryExpenseRepository::default();
        let service = Arc::new(ExpenseService::new(Arc::new(repo), clock));
        ExpenseRouter::new(service.clone(), service)
    }
}
