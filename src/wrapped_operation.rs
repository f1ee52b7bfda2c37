//! An operation paired with its cursor metadata (§4.5), threaded through the client state
//! machine and undo manager so cursor positions travel alongside the edits that produced them.

use crate::error::Error;
use crate::operation_meta::OperationMetadata;
use crate::text_operation::TextOperation;

#[derive(Debug, Clone, PartialEq)]
pub struct WrappedOperation {
    pub operation: TextOperation,
    pub meta: OperationMetadata,
}

impl WrappedOperation {
    #[must_use]
    pub fn new(operation: TextOperation, meta: OperationMetadata) -> Self {
        Self { operation, meta }
    }

    #[must_use]
    pub fn without_meta(operation: TextOperation) -> Self {
        Self::new(operation, OperationMetadata::default())
    }

    /// # Errors
    ///
    /// See [`TextOperation::apply`].
    pub fn apply(&self, doc: &str) -> Result<String, Error> {
        self.operation.apply(doc)
    }

    /// # Errors
    ///
    /// See [`TextOperation::invert`].
    pub fn invert(&self, doc: &str) -> Result<Self, Error> {
        Ok(Self::new(self.operation.invert(doc)?, self.meta.invert()))
    }

    /// # Errors
    ///
    /// See [`TextOperation::compose`].
    pub fn compose(&self, other: &Self) -> Result<Self, Error> {
        Ok(Self::new(
            self.operation.compose(&other.operation)?,
            self.meta.compose(&other.meta),
        ))
    }

    /// # Errors
    ///
    /// See [`TextOperation::transform`].
    pub fn transform(&self, other: &Self) -> Result<(Self, Self), Error> {
        let (op_prime, other_op_prime) = self.operation.transform(&other.operation)?;
        Ok((
            Self::new(op_prime, self.meta.transform(&other.operation)),
            Self::new(other_op_prime, other.meta.transform(&self.operation)),
        ))
    }

    #[must_use]
    pub fn should_be_composed_with(&self, other: &Self) -> bool {
        self.operation.should_be_composed_with(&other.operation)
    }

    #[must_use]
    pub fn should_be_composed_with_inverted(&self, other: &Self) -> bool {
        self.operation
            .should_be_composed_with_inverted(&other.operation)
    }
}
