/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
#[derive(Debug)]
pub enum Error {
    /// A doc-comment whose annotations could not be parsed
    AnnotationError { context: String, message: String },
    /// A command-line argument that failed validation
    InvalidArgument(String),
    /// The scanned path holds no `.php` files
    NoSourceFiles,
}

impl Error {
    /// Builds an annotation error for the given diagnostic context label
    pub fn annotation(context: &str, message: impl Into<String>) -> Self {
        Error::AnnotationError {
            context: context.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::AnnotationError { context, message } => {
                write!(f, "注解错误 {} in {}", message, context)
            }
            Error::InvalidArgument(msg) => write!(f, "无效参数: {}", msg),
            Error::NoSourceFiles => write!(f, "未找到 PHP 源文件"),
        }
    }
}

impl std::error::Error for Error {}
