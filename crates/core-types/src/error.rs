use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Price series is empty")]
    EmptySeries,

    #[error("Price series timestamps must be strictly increasing (bar {0} is not after bar {1})")]
    OutOfOrderBars(usize, usize),
}
