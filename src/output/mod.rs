pub(crate) mod atomic;
pub(crate) mod png_file;
pub(crate) mod sequence;
