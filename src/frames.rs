pub(crate) mod chunker;
pub(crate) mod range;
