pub mod api;

use crate::cli::Args;
use crate::engine::client::InferenceClient;
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    client: Arc<InferenceClient>,
    args: Args,
}

impl Server {
    pub fn new(client: Arc<InferenceClient>, args: Args) -> Self {
        Self { client, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(&self.args, self.client.clone()).await
    }
}
