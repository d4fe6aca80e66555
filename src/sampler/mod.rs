pub(crate) mod cancel;
pub(crate) mod cursor;
pub(crate) mod stream;
