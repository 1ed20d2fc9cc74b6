pub mod api;

use crate::cli::ServeArgs;
use crate::proxy::ProxyService;
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    service: Arc<ProxyService>,
    args: ServeArgs,
}

impl Server {
    pub fn new(service: Arc<ProxyService>, args: ServeArgs) -> Self {
        Self { service, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(self.service.clone(), &self.args).await
    }
}
