pub mod directive;
pub mod signer;
pub mod site;

pub use signer::SignerConfig;
pub use site::{HeaderTemplate, SiteConfig, Terminal};
