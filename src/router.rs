//! The decision core: forward or pass through.
//!
//! For every request, a path matching one of the configured prefixes is
//! forwarded to the backend origin; everything else is served by the static
//! pipeline. Built once at startup from the immutable configuration.

use anyhow::Result;

use crate::config::Config;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::proxy::origin::TargetOrigin;
use crate::proxy::routes::RouteTable;
use crate::proxy::upstream::ProxyHandler;
use crate::static_files::StaticFiles;

pub struct Router {
    routes: RouteTable,
    proxy: ProxyHandler,
    statics: StaticFiles,
}

impl Router {
    pub fn new(cfg: &Config) -> Result<Self> {
        let routes = RouteTable::new(cfg.upstream.routes.clone())?;
        let origin = TargetOrigin::parse(&cfg.upstream.origin)?;
        let proxy = ProxyHandler::new(origin)?;
        let statics = StaticFiles::new(&cfg.static_files);

        Ok(Self {
            routes,
            proxy,
            statics,
        })
    }

    /// Handle one request: forward-and-rewrite or pass-through.
    pub async fn handle(&self, request: &Request) -> Response {
        match self.routes.matches(&request.path) {
            Some(prefix) => {
                tracing::debug!(
                    method = request.method.as_str(),
                    path = %request.path,
                    prefix = prefix,
                    origin = %self.proxy.origin(),
                    "Forwarding request"
                );

                match self.proxy.forward(request).await {
                    Ok(response) => {
                        tracing::info!(
                            method = request.method.as_str(),
                            path = %request.path,
                            status = response.status.as_u16(),
                            "Request forwarded"
                        );
                        response
                    }
                    Err(e) => {
                        tracing::warn!(
                            method = request.method.as_str(),
                            path = %request.path,
                            error = %e,
                            "Upstream request failed"
                        );
                        Response::bad_gateway()
                    }
                }
            }
            None => self.statics.serve(request).await,
        }
    }
}
