use log::{error, info};

use club_service::{app, integration, state::AppState};

#[tokio::main]
async fn main() {
    let cfg = integration::Config::default();

    let state = AppState::init(&cfg);
    let router = app(state, &cfg.env);

    let addr = cfg.env.addr();
    info!("listening on {addr}, clubs stored in {:?}", cfg.collection);

    if let Err(e) = axum_server::bind(addr)
        .serve(router.into_make_service())
        .await
    {
        error!("server stopped: {e}");
    }
}
