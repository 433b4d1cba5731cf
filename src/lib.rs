// PhotoMark watermarking library

pub mod batch;
pub mod codec;
pub mod compositor;
pub mod logging;
pub mod settings;
