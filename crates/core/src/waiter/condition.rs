//! Compiled waiter conditions

use std::time::Duration;

use waitline_domain::constants::{DEFAULT_DELAY_SECS, DEFAULT_MAX_ATTEMPTS};
use waitline_domain::{
    normalize_waiter_name, DefinitionError, MaxAttempts, ProbeResult, WaiterDefinition,
};

use super::acceptor::{evaluate, Acceptor, Evaluation};

/// A named, ordered set of acceptors plus default polling parameters
///
/// Immutable once built. Sessions share it through `Arc`.
#[derive(Debug, Clone)]
pub struct Condition {
    name: String,
    operation: String,
    acceptors: Vec<Acceptor>,
    interval: Duration,
    max_attempts: MaxAttempts,
}

impl Condition {
    /// Start building a condition programmatically
    pub fn builder(name: impl Into<String>, operation: impl Into<String>) -> ConditionBuilder {
        ConditionBuilder {
            name: name.into(),
            operation: operation.into(),
            acceptors: Vec::new(),
            interval: Duration::from_secs(DEFAULT_DELAY_SECS),
            max_attempts: MaxAttempts::Limited(DEFAULT_MAX_ATTEMPTS),
        }
    }

    /// Validate and compile a document definition
    ///
    /// # Errors
    /// Returns the first `DefinitionError` found in the definition.
    pub fn from_definition(
        name: &str,
        definition: &WaiterDefinition,
    ) -> Result<Self, DefinitionError> {
        definition.validate(name)?;
        let acceptors = definition
            .acceptors
            .iter()
            .enumerate()
            .map(|(index, acceptor)| Acceptor::compile(acceptor, name, index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: normalize_waiter_name(name)?,
            operation: definition.operation.clone(),
            acceptors,
            interval: definition.delay_duration(),
            max_attempts: definition.max_attempts_limit(),
        })
    }

    /// Registry key, in `snake_case`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operation probed on every attempt
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn acceptors(&self) -> &[Acceptor] {
        &self.acceptors
    }

    /// Default delay between attempts
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> MaxAttempts {
        self.max_attempts
    }

    /// Apply the acceptors to one probe result
    pub fn evaluate(&self, result: &ProbeResult) -> Evaluation {
        evaluate(&self.acceptors, result)
    }
}

/// Builder for [`Condition`]
#[derive(Debug)]
pub struct ConditionBuilder {
    name: String,
    operation: String,
    acceptors: Vec<Acceptor>,
    interval: Duration,
    max_attempts: MaxAttempts,
}

impl ConditionBuilder {
    /// Append an acceptor; order is evaluation order
    pub fn acceptor(mut self, acceptor: Acceptor) -> Self {
        self.acceptors.push(acceptor);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn max_attempts(mut self, max_attempts: MaxAttempts) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// # Errors
    /// Returns `InvalidName`, `MissingOperation` or `NoAcceptors`.
    pub fn build(self) -> Result<Condition, DefinitionError> {
        let name = normalize_waiter_name(&self.name)?;
        if self.operation.trim().is_empty() {
            return Err(DefinitionError::MissingOperation { waiter: self.name });
        }
        if self.acceptors.is_empty() {
            return Err(DefinitionError::NoAcceptors { waiter: self.name });
        }
        Ok(Condition {
            name,
            operation: self.operation,
            acceptors: self.acceptors,
            interval: self.interval,
            max_attempts: self.max_attempts,
        })
    }
}
