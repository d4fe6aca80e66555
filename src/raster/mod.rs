pub(crate) mod assembler;
