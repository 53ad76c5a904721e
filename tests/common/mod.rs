mod test_app;

pub use test_app::{Multipart, TestApp, fake_jpeg};
