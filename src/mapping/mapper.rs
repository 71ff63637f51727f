//! Mapper trait

/// A pure mapping from one scalar to another
pub trait Mapper: Send + Sync {
    /// Map an input value to an output value
    fn map(&self, input: f64) -> f64;
}
