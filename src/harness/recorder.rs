//! Measurement recorder: one invocation attempt in, one measurement out

use crate::{
    client::{invoke, ApiClient, Subject},
    error::AppError,
    models::Measurement,
    types::QueryType,
};

/// Result of one recorded invocation. Failures still carry their measurement.
#[derive(Debug)]
pub enum InvocationOutcome {
    Success(Measurement),
    Failure { measurement: Measurement, error: AppError },
}

impl InvocationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationOutcome::Success(_))
    }

    pub fn measurement(&self) -> &Measurement {
        match self {
            InvocationOutcome::Success(m) => m,
            InvocationOutcome::Failure { measurement, .. } => measurement,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            InvocationOutcome::Success(_) => None,
            InvocationOutcome::Failure { error, .. } => Some(error),
        }
    }

    /// Split into the measurement to persist and the failure cause, if any
    pub fn into_parts(self) -> (Measurement, Option<AppError>) {
        match self {
            InvocationOutcome::Success(m) => (m, None),
            InvocationOutcome::Failure { measurement, error } => (measurement, Some(error)),
        }
    }
}

/// Wraps exactly one invocation. No retries.
pub struct Recorder;

impl Recorder {
    pub async fn record(client: &dyn ApiClient, query_type: QueryType, subject: &Subject) -> InvocationOutcome {
        let api_type = client.api_type();
        let name = query_type.operation_name();

        match invoke(client, query_type, subject).await {
            Ok(invocation) => InvocationOutcome::Success(Measurement::success(
                api_type,
                query_type,
                name,
                invocation.elapsed,
                invocation.byte_size,
            )),
            Err(error) => InvocationOutcome::Failure {
                measurement: Measurement::failure(api_type, query_type, name, error.to_string()),
                error,
            },
        }
    }
}
