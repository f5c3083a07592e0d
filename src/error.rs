use thiserror::Error;

/// zenoh errors are boxed trait objects that anyhow can't take directly
#[derive(Error, Debug)]
pub enum ErrorWrapper {
    #[error("zenoh error {0:?}")]
    ZenohError(zenoh::Error),
}
