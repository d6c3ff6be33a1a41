pub(crate) mod compat;
