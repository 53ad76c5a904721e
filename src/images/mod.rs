mod storage;

pub use storage::{
    DEFAULT_IMAGE, DEFAULT_IMAGE_NAME, IMAGE_SUFFIX, ImageBody, ImageStore, ImageStoreError,
};
