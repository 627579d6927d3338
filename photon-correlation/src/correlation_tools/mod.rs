pub mod correlator;
pub mod histogram;
pub mod limits;
pub mod permutations;
pub(crate) mod windowed_queue;
