pub mod enrich_output_adapter;
pub mod http_client;

pub use enrich_output_adapter::{FileEnrichOutputAdapter, StdoutEnrichOutputAdapter};
pub use http_client::ReqwestHttp;
