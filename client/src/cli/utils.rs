use neviweb_client_rs::{NeviwebClient, NeviwebClientError, NeviwebOptions};

use crate::Params;

pub fn create_client(params: &Params) -> Result<NeviwebClient, NeviwebClientError> {
    let options = NeviwebOptions::builder()
        .base_url(params.base_url.clone())
        .session_id(params.session_id.clone())
        .build()
        .map_err(|e| NeviwebClientError::OptionsError(e.to_string()))?;
    NeviwebClient::new(options)
}
