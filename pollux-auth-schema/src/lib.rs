pub mod code_assist;
pub mod oauth;

pub use code_assist::{
    ClientMetadata, CompanionProject, LoadCodeAssistRequest, LoadCodeAssistResponse,
};
pub use oauth::{TokenExchangeResponse, UserInfo};
