use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataUrlError {
    #[error("Payload too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },
}
