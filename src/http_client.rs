use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

use crate::error::{LeagueError, Result};

// Upper bound for any request; callers set tighter per-request timeouts.
const REQUEST_TIMEOUT_SECS: u64 = 30;

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("league_sim/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| LeagueError::predictor(format!("failed to build http client: {err}")))
    })
}
