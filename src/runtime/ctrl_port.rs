//! REST control plane
//!
//! Exposes the flowgraphs of a [`Runtime`](crate::runtime::Runtime) over
//! HTTP+JSON:
//!
//! * `GET /api/fg/` lists flowgraph summaries.
//! * `GET /api/fg/{fg}/` describes a flowgraph.
//! * `GET /api/fg/{fg}/block/{blk}/` describes a block.
//! * `GET /api/fg/{fg}/block/{blk}/call/{handler}/` invokes a message
//!   handler with [`Pmt::Null`], returning the result.
//! * `POST /api/fg/{fg}/block/{blk}/call/{handler}/` invokes a message
//!   handler with the [`Pmt`] given as JSON body.
//!
//! Handlers are addressed by index or name. Unknown flowgraph, block, or
//! handler ids map to `404 Not Found`, rejected or malformed arguments to
//! `400 Bad Request`, and runtime failures to `500 Internal Server Error`.
use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use std::net::SocketAddr;
use std::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::runtime::BlockDescription;
use crate::runtime::BlockId;
use crate::runtime::Error;
use crate::runtime::FlowgraphDescription;
use crate::runtime::FlowgraphId;
use crate::runtime::FlowgraphSummary;
use crate::runtime::Pmt;
use crate::runtime::PortId;
use crate::runtime::RuntimeHandle;
use crate::runtime::config;

struct CtrlPortError(Error);

impl From<Error> for CtrlPortError {
    fn from(e: Error) -> Self {
        CtrlPortError(e)
    }
}

impl IntoResponse for CtrlPortError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidFlowgraph(_)
            | Error::InvalidBlock(_)
            | Error::InvalidMessagePort(..) => StatusCode::NOT_FOUND,
            Error::HandlerError(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}

async fn flowgraphs(State(rt): State<RuntimeHandle>) -> Json<Vec<FlowgraphSummary>> {
    Json(rt.flowgraphs().await)
}

async fn flowgraph_description(
    Path(fg): Path<usize>,
    State(rt): State<RuntimeHandle>,
) -> Result<Json<FlowgraphDescription>, CtrlPortError> {
    let mut fg = rt
        .get_flowgraph(FlowgraphId(fg))
        .await
        .ok_or(Error::InvalidFlowgraph(FlowgraphId(fg)))?;
    Ok(Json(fg.description().await?))
}

async fn block_description(
    Path((fg, blk)): Path<(usize, usize)>,
    State(rt): State<RuntimeHandle>,
) -> Result<Json<BlockDescription>, CtrlPortError> {
    let mut fg = rt
        .get_flowgraph(FlowgraphId(fg))
        .await
        .ok_or(Error::InvalidFlowgraph(FlowgraphId(fg)))?;
    Ok(Json(fg.block_description(BlockId(blk)).await?))
}

async fn handler_call(
    Path((fg, blk, handler)): Path<(usize, usize, String)>,
    State(rt): State<RuntimeHandle>,
) -> Result<Json<Pmt>, CtrlPortError> {
    let mut fg = rt
        .get_flowgraph(FlowgraphId(fg))
        .await
        .ok_or(Error::InvalidFlowgraph(FlowgraphId(fg)))?;
    let ret = fg
        .callback(BlockId(blk), PortId::from(handler), Pmt::Null)
        .await?;
    Ok(Json(ret))
}

async fn handler_call_post(
    Path((fg, blk, handler)): Path<(usize, usize, String)>,
    State(rt): State<RuntimeHandle>,
    Json(pmt): Json<Pmt>,
) -> Result<Json<Pmt>, CtrlPortError> {
    let mut fg = rt
        .get_flowgraph(FlowgraphId(fg))
        .await
        .ok_or(Error::InvalidFlowgraph(FlowgraphId(fg)))?;
    let ret = fg.callback(BlockId(blk), PortId::from(handler), pmt).await?;
    Ok(Json(ret))
}

fn routes(handle: RuntimeHandle, custom_routes: Router<RuntimeHandle>) -> Router {
    let mut app = Router::new()
        .route("/api/fg/", get(flowgraphs))
        .route("/api/fg/{fg}/", get(flowgraph_description))
        .route("/api/fg/{fg}/block/{blk}/", get(block_description))
        .route(
            "/api/fg/{fg}/block/{blk}/call/{handler}/",
            get(handler_call).post(handler_call_post),
        )
        .merge(custom_routes)
        .layer(CorsLayer::permissive());

    if let Some(ref p) = config::config().frontend_path {
        app = app.fallback_service(ServeDir::new(p));
    }

    app.with_state(handle)
}

/// The webserver that exposes the REST control plane.
///
/// Runs on its own thread with a current-thread tokio runtime, bound
/// according to the `ctrlport_enable` and `ctrlport_bind` config values.
pub struct ControlPort {
    addr: Option<SocketAddr>,
}

impl ControlPort {
    pub(crate) fn new(handle: RuntimeHandle, custom_routes: Router<RuntimeHandle>) -> Self {
        if !config::config().ctrlport_enable {
            return ControlPort { addr: None };
        }

        let bind = config::config().ctrlport_bind;
        let listener = match TcpListener::bind(&bind) {
            Ok(l) => l,
            Err(e) => {
                warn!("control port failed to bind {} ({})", bind, e);
                return ControlPort { addr: None };
            }
        };
        if let Err(e) = listener.set_nonblocking(true) {
            warn!("control port listener setup failed ({})", e);
            return ControlPort { addr: None };
        }
        let addr = match listener.local_addr() {
            Ok(a) => a,
            Err(e) => {
                warn!("control port listener setup failed ({})", e);
                return ControlPort { addr: None };
            }
        };

        let app = routes(handle, custom_routes);

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build tokio runtime for control port");

            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener)
                    .expect("failed to register control port listener");
                debug!("control port listening on {}", addr);
                if let Err(e) = axum::serve(listener, app).await {
                    error!("control port server failed ({})", e);
                }
            });
        });

        ControlPort { addr: Some(addr) }
    }

    /// Address the webserver is bound to, `None` if it is disabled
    pub fn addr(&self) -> Option<SocketAddr> {
        self.addr
    }
}
