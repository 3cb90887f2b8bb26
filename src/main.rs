mod config;

use api::{
    discord::Discord,
    fetch::{Fetcher, APPLICATION_JSON},
    interaction::{self, PublicKey},
    Bot,
};
use config::Config;
use db::Catalog;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::{Bytes, Incoming},
    header::{HeaderValue, CONTENT_TYPE},
    server::conn::http1,
    service::service_fn,
    Method, Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use std::{convert::Infallible, net::Ipv4Addr, sync::Arc};
use tokio::{net::TcpListener, runtime::Runtime};

type App = Bot<Discord>;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::from_env()?;
    let runtime = Runtime::new()?;
    runtime.block_on(run(config))
}

async fn run(config: Config) -> anyhow::Result<()> {
    let Config { port, app, token, public_key, quiz_data, owner, guild } = config;

    // A corrupt catalog must never be silently replaced.
    let catalog = Catalog::load(quiz_data).await?;

    let fetcher = Fetcher::new();
    match fetcher.register_commands(app, guild, &token, api::COMMANDS).await {
        Ok(()) => log::info!("registered slash commands"),
        Err(err) => log::warn!("failed to register slash commands: {err}"),
    }

    let bot = Arc::new(Bot::new(Arc::new(Discord::new(token)), catalog, fetcher, owner));
    let public = Arc::new(public_key);

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await?;
    log::info!("listening for interactions on port {port}");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        let (stream, addr) = tokio::select! {
            biased;
            res = &mut shutdown => {
                res?;
                break;
            }
            res = listener.accept() => match res {
                Ok(conn) => conn,
                Err(err) => {
                    log::warn!("failed to accept connection: {err}");
                    continue;
                }
            },
        };

        let bot = Arc::clone(&bot);
        let public = Arc::clone(&public);
        tokio::spawn(async move {
            let service = service_fn(move |req| handle(req, Arc::clone(&bot), Arc::clone(&public)));
            if let Err(err) = http1::Builder::new().serve_connection(TokioIo::new(stream), service).await {
                log::debug!("connection with {addr} closed: {err}");
            }
        });
    }

    log::info!("shutting down");
    Ok(())
}

fn status(code: StatusCode) -> Response<Full<Bytes>> {
    let mut res = Response::new(Full::default());
    *res.status_mut() = code;
    res
}

async fn handle(req: Request<Incoming>, bot: Arc<App>, public: Arc<PublicKey>) -> Result<Response<Full<Bytes>>, Infallible> {
    // For now, we only allow requests from the root endpoint.
    if req.method() != Method::POST || req.uri().path() != "/" {
        return Ok(status(StatusCode::NOT_FOUND));
    }

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(body) => body.to_bytes(),
        Err(err) => {
            log::debug!("failed to read request body: {err}");
            return Ok(status(StatusCode::BAD_REQUEST));
        }
    };

    let bytes = match interaction::try_respond(&*bot, &*public, &parts.headers, &body).await {
        Ok(bytes) => bytes,
        Err(code) => return Ok(status(code)),
    };

    let mut res = Response::new(Full::new(Bytes::from(bytes)));
    res.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    Ok(res)
}
