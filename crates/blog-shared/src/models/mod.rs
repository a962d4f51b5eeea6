mod article;
mod comment;

pub use article::*;
pub use comment::*;
