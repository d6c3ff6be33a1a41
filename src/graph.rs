pub(crate) mod author;
pub(crate) mod command;
pub(crate) mod model;
pub(crate) mod validate;
