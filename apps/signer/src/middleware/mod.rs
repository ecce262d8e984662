pub mod header_inject;
pub mod jwt_signer;
pub mod request_log;
pub mod request_trace;

pub use header_inject::HeaderInject;
pub use jwt_signer::JwtSigner;
pub use request_log::RequestLog;
pub use request_trace::RequestTrace;
