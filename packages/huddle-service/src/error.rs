pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Query analysis failed: {message}")]
	AnalysisFailed { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<huddle_storage::Error> for Error {
	fn from(err: huddle_storage::Error) -> Self {
		match err {
			huddle_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			huddle_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}

impl From<huddle_providers::Error> for Error {
	fn from(err: huddle_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
