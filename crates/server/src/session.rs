//! One storage session per request.

use std::ops::Deref;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use service::{Storage, StorageEngine};
use tracing::warn;

/// The request's storage session, placed in request extensions by
/// [`storage_session`].
#[derive(Clone)]
pub struct Session(pub Arc<dyn Storage>);

impl Deref for Session {
    type Target = dyn Storage;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

/// Open a session before the handler and close it after, whatever the handler
/// returned.
pub async fn storage_session(State(engine): State<StorageEngine>, mut req: Request, next: Next) -> Response {
    let session = engine.session();
    req.extensions_mut().insert(Session(Arc::clone(&session)));
    let res = next.run(req).await;
    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to close storage session");
    }
    res
}
