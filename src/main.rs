use dotenv::dotenv;
use log::*;
use tide::security::{CorsMiddleware, Origin};

use std::sync::Arc;

mod api_models;
mod config;
mod error;
mod models;
mod poll;
mod schema;
mod store;

use crate::config::Config;
use crate::store::{PgTallyStore, TallyStore};

/**
 * Struct for carrying application state into tide request handlers
 */
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TallyStore>,
}

/**
 * Assemble the tide server with its middleware and routes
 */
fn build_app(state: AppState) -> tide::Server<AppState> {
    let mut app = tide::with_state(state);
    app.with(
        CorsMiddleware::new()
            .allow_origin(Origin::from("*"))
            .allow_credentials(false),
    );
    app.at("/options").get(routes::options);
    app.at("/vote/:option_id").post(routes::vote);
    app.at("/results").get(routes::results);
    app.at("/healthz").get(routes::health);
    app
}

/**
 * The routes module contains all the tide routes and the logic to fulfill the responses for each
 * route.
 */
mod routes {
    use log::*;
    use serde::Serialize;
    use tide::{Body, Request, Response, StatusCode};

    use crate::api_models::{ErrorBody, Health};
    use crate::error::{Operation, PollError};
    use crate::poll;
    use crate::AppState;

    fn json<T: Serialize>(status: StatusCode, body: &T) -> tide::Result<Response> {
        Ok(Response::builder(status).body(Body::from_json(body)?).build())
    }

    fn failure(err: PollError, op: Operation) -> tide::Result<Response> {
        json(
            err.status(),
            &ErrorBody {
                error: err.public_message(op).to_string(),
            },
        )
    }

    /**
    *  GET /options
    */
    pub async fn options(_req: Request<AppState>) -> tide::Result<Response> {
        json(StatusCode::Ok, &poll::options())
    }

    /**
    *  POST /vote/:option_id
    */
    pub async fn vote(req: Request<AppState>) -> tide::Result<Response> {
        let option_id = req.param("option_id")?.to_string();

        match poll::cast_vote(req.state().store.as_ref(), &option_id).await {
            Ok(receipt) => json(StatusCode::Ok, &receipt),
            Err(err) => {
                warn!("Vote for {:?} failed: {}", option_id, err);
                failure(err, Operation::Vote)
            }
        }
    }

    /**
    *  GET /results
    */
    pub async fn results(req: Request<AppState>) -> tide::Result<Response> {
        match poll::results(req.state().store.as_ref()).await {
            Ok(results) => json(StatusCode::Ok, &results),
            Err(err) => {
                warn!("Results failed: {}", err);
                failure(err, Operation::Results)
            }
        }
    }

    /**
    *  GET /healthz
    *
    *  Does not look at the database
    */
    pub async fn health(_req: Request<AppState>) -> tide::Result<Response> {
        json(
            StatusCode::Ok,
            &Health {
                status: "ok".to_string(),
            },
        )
    }
}

fn to_io(err: error::PollError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err)
}

#[async_std::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv().ok();
    pretty_env_logger::init();

    let config = Config::from_env().map_err(|err| {
        error!("Could not load configuration! {}", err);
        to_io(err)
    })?;

    let store = PgTallyStore::connect_lazy(&config.db).map_err(|err| {
        error!("Could not initialize pool! {}", err);
        to_io(err)
    })?;
    info!("Using database {}", config.db.describe());

    let app = build_app(AppState {
        store: Arc::new(store),
    });
    info!("Listening on {}", config.listen_addr);
    app.listen(config.listen_addr).await?;
    Ok(())
}
