use crate::governor::surface::Endpoint;

#[derive(Debug, thiserror::Error)]
pub enum GovernorError {
    #[error("The {0} control endpoint is not present")]
    NotPresent(Endpoint),
    #[error("Failed to write `{value}` to the {endpoint} control endpoint: {source}")]
    Write {
        endpoint: Endpoint,
        value: String,
        #[source]
        source: std::io::Error,
    },
    #[error("The CPU governor is not available")]
    NotAvailable,
    #[error("The CPU governor was already initialised")]
    AlreadyInitialised,
}
