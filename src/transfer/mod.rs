pub mod agent;
pub mod offload;
pub mod remote;
pub mod retry;

pub use agent::TransferAgent;
pub use remote::{RemoteCopy, ScpCopy};
pub use retry::RetryPolicy;
