//! Handler modules for ponto-api.

pub mod encoding;
