mod request_client;

pub use request_client::{RequestOutcome, RetryAttempt, RetryingRequestClient};
