pub mod antigravity;

mod http_client;

pub(crate) use http_client::build_client;
